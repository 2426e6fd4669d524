//! Review scheduling on top of a card store.
//!
//! `ReviewScheduler` owns its store and clock; construct one per process (or
//! per test) and share it by reference.

use crate::clock::Clock;
use crate::database::CardStore;
use crate::error::{Result, SchedulerError};
use crate::models::sm2::apply_review;
use crate::models::{ItemId, OwnerId, OwnerStats, ReviewCard, ReviewOutcome, ScheduleParams};
use chrono::{DateTime, Utc};

/// Counts reported by `ReviewScheduler::import_cards`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

pub struct ReviewScheduler<S, C> {
    store: S,
    clock: C,
    params: ScheduleParams,
}

impl<S: CardStore, C: Clock> ReviewScheduler<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_params(store, clock, ScheduleParams::default())
    }

    pub fn with_params(store: S, clock: C, params: ScheduleParams) -> Self {
        Self {
            store,
            clock,
            params,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    /// Starts tracking `item` for `owner`, due one interval from now.
    pub fn create_card(&self, owner: &OwnerId, item: &ItemId) -> Result<ReviewCard> {
        let card = ReviewCard::new(owner.clone(), item.clone(), self.clock.now(), &self.params);
        let card = self.store.insert(card)?;
        log::info!(
            "created card {}/{} due {}",
            owner,
            item,
            card.next_review_at
        );
        Ok(card)
    }

    pub fn get_card(&self, owner: &OwnerId, item: &ItemId) -> Result<ReviewCard> {
        self.store
            .get(owner, item)?
            .ok_or_else(|| SchedulerError::CardNotFound {
                owner: owner.clone(),
                item: item.clone(),
            })
    }

    pub fn list_cards(&self, owner: &OwnerId) -> Result<Vec<ReviewCard>> {
        self.store.list(owner)
    }

    /// Records one recall check and reschedules the card.
    pub fn submit_review(
        &self,
        owner: &OwnerId,
        item: &ItemId,
        correct: bool,
        response_time_ms: f64,
    ) -> Result<ReviewCard> {
        if !response_time_ms.is_finite() || response_time_ms < 0.0 {
            return Err(SchedulerError::InvalidResponseTime(response_time_ms));
        }

        let outcome = ReviewOutcome {
            correct,
            response_time_ms,
        };
        let reviewed_at = self.clock.now();
        let card = self.store.update_with(owner, item, &|card| {
            apply_review(card, outcome, reviewed_at, &self.params)
        })?;

        log::debug!(
            "reviewed {}/{} correct={} -> interval {}d, repetition {}, ease {:.2}, next {}",
            owner,
            item,
            correct,
            card.interval_days,
            card.repetition_count,
            card.ease_factor,
            card.next_review_at
        );
        Ok(card)
    }

    /// Cards due at `as_of`, earliest first. Each call is a fresh query.
    pub fn due_cards(&self, owner: &OwnerId, as_of: DateTime<Utc>) -> Result<Vec<ReviewCard>> {
        self.store.due(owner, as_of)
    }

    pub fn due_now(&self, owner: &OwnerId) -> Result<Vec<ReviewCard>> {
        self.due_cards(owner, self.clock.now())
    }

    pub fn stats(&self, owner: &OwnerId, as_of: DateTime<Utc>) -> Result<OwnerStats> {
        Ok(OwnerStats::from_cards(&self.store.list(owner)?, as_of))
    }

    /// Inserts previously exported cards, skipping ones the store already has.
    pub fn import_cards(&self, cards: Vec<ReviewCard>) -> Result<ImportReport> {
        for card in &cards {
            card.validate(&self.params)
                .map_err(SchedulerError::InvalidCard)?;
        }

        let mut report = ImportReport::default();
        for card in cards {
            match self.store.insert(card) {
                Ok(_) => report.imported += 1,
                Err(SchedulerError::DuplicateCard { owner, item }) => {
                    log::warn!("skipping import of existing card {}/{}", owner, item);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "imported {} cards ({} already present)",
            report.imported,
            report.skipped
        );
        Ok(report)
    }
}
