pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod scheduler;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use database::{CardStore, MemoryCardStore, SqliteCardStore};
pub use error::{Result, SchedulerError};
pub use models::{ItemId, OwnerId, OwnerStats, ReviewCard, ScheduleParams};
pub use scheduler::{ImportReport, ReviewScheduler};
pub use session::ReviewSession;
