//! In-process card store.

use super::CardStore;
use crate::error::{Result, SchedulerError};
use crate::models::{ItemId, OwnerId, ReviewCard};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

type CardKey = (OwnerId, ItemId);

#[derive(Debug, Default)]
pub struct MemoryCardStore {
    cards: Mutex<HashMap<CardKey, ReviewCard>>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cards(&self) -> MutexGuard<'_, HashMap<CardKey, ReviewCard>> {
        // Updates are whole-card replacements, so the map is consistent even after a panic.
        self.cards.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CardStore for MemoryCardStore {
    fn insert(&self, card: ReviewCard) -> Result<ReviewCard> {
        let mut cards = self.cards();
        let key = (card.owner_id.clone(), card.item_id.clone());
        if cards.contains_key(&key) {
            return Err(SchedulerError::DuplicateCard {
                owner: key.0,
                item: key.1,
            });
        }
        cards.insert(key, card.clone());
        Ok(card)
    }

    fn get(&self, owner: &OwnerId, item: &ItemId) -> Result<Option<ReviewCard>> {
        Ok(self
            .cards()
            .get(&(owner.clone(), item.clone()))
            .cloned())
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<ReviewCard>> {
        Ok(self
            .cards()
            .values()
            .filter(|card| &card.owner_id == owner)
            .cloned()
            .collect())
    }

    fn update_with(
        &self,
        owner: &OwnerId,
        item: &ItemId,
        apply: &dyn Fn(&ReviewCard) -> ReviewCard,
    ) -> Result<ReviewCard> {
        let mut cards = self.cards();
        let card = cards
            .get_mut(&(owner.clone(), item.clone()))
            .ok_or_else(|| SchedulerError::CardNotFound {
                owner: owner.clone(),
                item: item.clone(),
            })?;
        *card = apply(card);
        Ok(card.clone())
    }

    fn owners(&self) -> Result<Vec<OwnerId>> {
        let owners: BTreeSet<OwnerId> = self.cards().keys().map(|(o, _)| o.clone()).collect();
        Ok(owners.into_iter().collect())
    }
}
