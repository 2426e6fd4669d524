//! Card persistence.
//!
//! Stores own every `ReviewCard` and serialize updates per (owner, item) key:
//! `update_with` is an atomic read-modify-write of exactly one card.

pub mod db;
pub mod memory;

use crate::error::Result;
use crate::models::{ItemId, OwnerId, ReviewCard};
use chrono::{DateTime, Utc};

pub use db::SqliteCardStore;
pub use memory::MemoryCardStore;

pub trait CardStore: Send + Sync {
    /// Inserts a new card. Fails with `DuplicateCard` if the key is taken.
    fn insert(&self, card: ReviewCard) -> Result<ReviewCard>;

    fn get(&self, owner: &OwnerId, item: &ItemId) -> Result<Option<ReviewCard>>;

    fn list(&self, owner: &OwnerId) -> Result<Vec<ReviewCard>>;

    /// Replaces a card with `apply(current)` without letting another update interleave.
    /// Fails with `CardNotFound` if no card exists.
    fn update_with(
        &self,
        owner: &OwnerId,
        item: &ItemId,
        apply: &dyn Fn(&ReviewCard) -> ReviewCard,
    ) -> Result<ReviewCard>;

    fn owners(&self) -> Result<Vec<OwnerId>>;

    /// Cards with `next_review_at <= as_of`, earliest due first, ties broken by item id.
    fn due(&self, owner: &OwnerId, as_of: DateTime<Utc>) -> Result<Vec<ReviewCard>> {
        let mut cards: Vec<ReviewCard> = self
            .list(owner)?
            .into_iter()
            .filter(|card| card.is_due(as_of))
            .collect();
        sort_by_due_date(&mut cards);
        Ok(cards)
    }
}

pub fn sort_by_due_date(cards: &mut [ReviewCard]) {
    cards.sort_by(|a, b| {
        a.next_review_at
            .cmp(&b.next_review_at)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}
