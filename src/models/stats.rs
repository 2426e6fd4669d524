//! Per-learner review summary.
use super::ReviewCard;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OwnerStats {
    pub total_cards: usize,
    pub due_cards: usize,
    pub total_reviews: u64,
    pub mean_ease_factor: f64,
    /// Mean latency over every review, weighted by each card's review count.
    pub average_response_time_ms: f64,
    pub longest_streak: u32,
}

impl OwnerStats {
    pub fn from_cards(cards: &[ReviewCard], as_of: DateTime<Utc>) -> Self {
        if cards.is_empty() {
            return Self::default();
        }

        let total_reviews: u64 = cards.iter().map(|c| u64::from(c.total_reviews)).sum();
        let weighted_time: f64 = cards
            .iter()
            .map(|c| c.average_response_time_ms * f64::from(c.total_reviews))
            .sum();

        Self {
            total_cards: cards.len(),
            due_cards: cards.iter().filter(|c| c.is_due(as_of)).count(),
            total_reviews,
            mean_ease_factor: cards.iter().map(|c| c.ease_factor).sum::<f64>() / cards.len() as f64,
            average_response_time_ms: if total_reviews == 0 {
                0.0
            } else {
                weighted_time / total_reviews as f64
            },
            longest_streak: cards.iter().map(|c| c.correct_streak).max().unwrap_or(0),
        }
    }
}
