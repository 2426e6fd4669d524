//! Scheduling record for one (learner, vocabulary item) pair.
use super::ScheduleParams;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque learner identifier supplied by the identity layer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

/// Opaque vocabulary item identifier supplied by the lesson catalog.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(OwnerId);
string_id!(ItemId);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewCard {
    pub owner_id: OwnerId,
    pub item_id: ItemId,
    pub interval_days: u32,
    pub repetition_count: u32,
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
    pub correct_streak: u32,
    pub total_reviews: u32,
    pub average_response_time_ms: f64,
}

impl ReviewCard {
    /// Card in its default state: due one interval after `created_at`.
    pub fn new(
        owner_id: OwnerId,
        item_id: ItemId,
        created_at: DateTime<Utc>,
        params: &ScheduleParams,
    ) -> Self {
        let interval_days = params.first_interval_days;
        Self {
            owner_id,
            item_id,
            interval_days,
            repetition_count: 0,
            ease_factor: params.initial_ease,
            next_review_at: created_at + Duration::days(i64::from(interval_days)),
            last_reviewed_at: created_at,
            correct_streak: 0,
            total_reviews: 0,
            average_response_time_ms: 0.0,
        }
    }

    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.next_review_at <= as_of
    }

    /// Checks the invariants a stored or imported card must satisfy.
    pub fn validate(&self, params: &ScheduleParams) -> Result<(), String> {
        if self.interval_days < 1 {
            return Err(format!("{}: interval must be at least 1 day", self.item_id));
        }
        if self.interval_days > params.max_interval_days {
            return Err(format!(
                "{}: interval of {} days exceeds the {} day limit",
                self.item_id, self.interval_days, params.max_interval_days
            ));
        }
        if !self.ease_factor.is_finite() || self.ease_factor < params.min_ease {
            return Err(format!(
                "{}: ease factor {} is below {}",
                self.item_id, self.ease_factor, params.min_ease
            ));
        }
        if !self.average_response_time_ms.is_finite() || self.average_response_time_ms < 0.0 {
            return Err(format!("{}: average response time is not valid", self.item_id));
        }
        let expected = self
            .last_reviewed_at
            .checked_add_signed(Duration::days(i64::from(self.interval_days)));
        if expected != Some(self.next_review_at) {
            return Err(format!(
                "{}: next review does not follow last review by {} days",
                self.item_id, self.interval_days
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_card_defaults() {
        let card = ReviewCard::new(
            "1".into(),
            "apple".into(),
            created(),
            &ScheduleParams::default(),
        );

        assert_eq!(card.interval_days, 1);
        assert_eq!(card.repetition_count, 0);
        assert_eq!(card.ease_factor, 2.5);
        assert_eq!(card.correct_streak, 0);
        assert_eq!(card.total_reviews, 0);
        assert_eq!(card.last_reviewed_at, created());
        assert_eq!(card.next_review_at, created() + Duration::days(1));
    }

    #[test]
    fn test_is_due_boundary() {
        let card = ReviewCard::new(
            "1".into(),
            "apple".into(),
            created(),
            &ScheduleParams::default(),
        );

        assert!(!card.is_due(created()));
        assert!(card.is_due(card.next_review_at));
    }

    #[test]
    fn test_validate_rejects_broken_cards() {
        let params = ScheduleParams::default();
        let card = ReviewCard::new("1".into(), "apple".into(), created(), &params);
        assert!(card.validate(&params).is_ok());

        let mut low_ease = card.clone();
        low_ease.ease_factor = 1.0;
        assert!(low_ease.validate(&params).is_err());

        let mut zero_interval = card.clone();
        zero_interval.interval_days = 0;
        assert!(zero_interval.validate(&params).is_err());

        let mut over_cap = card.clone();
        over_cap.interval_days = u32::MAX;
        assert!(over_cap.validate(&params).is_err());

        let mut drifted = card;
        drifted.next_review_at = drifted.next_review_at + Duration::hours(1);
        assert!(drifted.validate(&params).is_err());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&OwnerId::from("learner-7")).unwrap();
        assert_eq!(json, "\"learner-7\"");
    }
}
