//! SM-2 (SuperMemo 2) derived review scheduling.
//!
//! Each review is a boolean recall check rather than a 0-5 grade:
//! - Correct: repetition count grows and the interval progresses 1 day → 6 days → interval × EF
//! - Correct reviews raise the easiness factor (EF) by a fixed bonus
//! - Incorrect: interval and repetitions reset, EF is left alone
//! - EF never falls below its floor of 1.3

use super::ReviewCard;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Constants of the scheduling rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    pub initial_ease: f64,
    pub min_ease: f64,
    pub ease_bonus: f64,
    pub first_interval_days: u32,
    pub second_interval_days: u32,
    /// Upper bound on any interval so due dates stay representable.
    pub max_interval_days: u32,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            min_ease: 1.3,
            ease_bonus: 0.1,
            first_interval_days: 1,
            second_interval_days: 6,
            max_interval_days: 36_500,
        }
    }
}

impl ScheduleParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.min_ease.is_finite() || self.min_ease < 1.0 {
            return Err(format!("min_ease must be at least 1.0, got {}", self.min_ease));
        }
        if !self.initial_ease.is_finite() || self.initial_ease < self.min_ease {
            return Err(format!(
                "initial_ease {} is below min_ease {}",
                self.initial_ease, self.min_ease
            ));
        }
        if !self.ease_bonus.is_finite() || self.ease_bonus < 0.0 {
            return Err(format!(
                "ease_bonus must be a non-negative number, got {}",
                self.ease_bonus
            ));
        }
        if self.first_interval_days < 1 || self.second_interval_days < 1 {
            return Err("intervals must be at least 1 day".to_string());
        }
        if self.max_interval_days < self.second_interval_days.max(self.first_interval_days) {
            return Err(format!(
                "max_interval_days {} is shorter than the fixed intervals",
                self.max_interval_days
            ));
        }
        Ok(())
    }
}

/// Result of one recall check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReviewOutcome {
    pub correct: bool,
    pub response_time_ms: f64,
}

/// Calculates the card state after a review at `reviewed_at`.
pub fn apply_review(
    card: &ReviewCard,
    outcome: ReviewOutcome,
    reviewed_at: DateTime<Utc>,
    params: &ScheduleParams,
) -> ReviewCard {
    let mut next = card.clone();

    next.total_reviews = card.total_reviews.saturating_add(1);
    let total = f64::from(next.total_reviews);
    next.average_response_time_ms =
        (card.average_response_time_ms * (total - 1.0) + outcome.response_time_ms) / total;
    next.last_reviewed_at = reviewed_at;

    if outcome.correct {
        next.correct_streak = card.correct_streak.saturating_add(1);
        next.repetition_count = card.repetition_count.saturating_add(1);
        next.ease_factor = (card.ease_factor + params.ease_bonus).max(params.min_ease);

        next.interval_days = match next.repetition_count {
            1 => params.first_interval_days,
            2 => params.second_interval_days,
            // Subsequent: multiply by the updated EF
            _ => (f64::from(card.interval_days) * next.ease_factor).round() as u32,
        }
        .clamp(1, params.max_interval_days.max(1));
    } else {
        next.correct_streak = 0;
        next.repetition_count = 0;
        next.interval_days = 1;
    }

    next.next_review_at = reviewed_at + Duration::days(i64::from(next.interval_days));
    next
}
