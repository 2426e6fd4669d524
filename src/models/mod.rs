pub mod review_card;
pub mod sm2;
pub mod stats;

pub use review_card::{ItemId, OwnerId, ReviewCard};
pub use sm2::{ReviewOutcome, ScheduleParams};
pub use stats::OwnerStats;
