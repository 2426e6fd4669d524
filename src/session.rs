//! Review session over a learner's due cards.
//! Cards answered incorrectly come back in later rounds until each one is recalled.

use crate::clock::Clock;
use crate::database::CardStore;
use crate::error::Result;
use crate::models::{OwnerId, ReviewCard};
use crate::scheduler::ReviewScheduler;

/// Walks the due set in rounds, submitting every answer to the scheduler.
pub struct ReviewSession<'a, S, C> {
    scheduler: &'a ReviewScheduler<S, C>,
    pub owner: OwnerId,
    pub cards: Vec<(ReviewCard, bool)>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub round_number: usize,
}

impl<'a, S: CardStore, C: Clock> ReviewSession<'a, S, C> {
    /// Creates a session from the cards that are due right now.
    pub fn start(scheduler: &'a ReviewScheduler<S, C>, owner: OwnerId) -> Result<Self> {
        let due = scheduler.due_now(&owner)?;
        log::debug!("starting session for {} with {} due cards", owner, due.len());

        let indices: Vec<usize> = (0..due.len()).collect();
        Ok(Self {
            scheduler,
            owner,
            cards: due.into_iter().map(|card| (card, false)).collect(),
            current_round_cards: indices,
            current_index: 0,
            round_number: 1,
        })
    }

    pub fn current_card(&self) -> Option<&ReviewCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx).map(|(card, _)| card))
    }

    /// Submits the answer for the current card and moves to the next one.
    pub fn grade_current_card(&mut self, correct: bool, response_time_ms: f64) -> Result<()> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(());
        };
        let Some((card, recalled)) = self.cards.get_mut(idx) else {
            return Ok(());
        };

        let updated =
            self.scheduler
                .submit_review(&card.owner_id, &card.item_id, correct, response_time_ms)?;
        *card = updated;
        *recalled = correct;

        self.next_card();
        Ok(())
    }

    fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that were missed.
    /// If none were missed the session is complete.
    fn start_next_round(&mut self) {
        let missed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.cards.get(idx).is_some_and(|(_, recalled)| !recalled))
            .collect();

        if !missed.is_empty() {
            self.round_number += 1;
        }
        self.current_round_cards = missed;
        self.current_index = 0;
    }

    pub fn recalled_count(&self) -> usize {
        self.cards.iter().filter(|(_, recalled)| *recalled).count()
    }

    pub fn total_count(&self) -> usize {
        self.cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.recalled_count()
    }

    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.current_round_cards.len())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.current_round_cards.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::MemoryCardStore;
    use chrono::{TimeZone, Utc};

    fn scheduler_with_due(items: &[&str]) -> ReviewScheduler<MemoryCardStore, ManualClock> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let scheduler = ReviewScheduler::new(MemoryCardStore::new(), ManualClock::new(start));
        for item in items {
            scheduler.create_card(&"1".into(), &(*item).into()).unwrap();
        }
        scheduler.clock().advance_days(1);
        scheduler
    }

    #[test]
    fn test_empty_session_is_complete() {
        let scheduler = scheduler_with_due(&[]);
        let session = ReviewSession::start(&scheduler, "1".into()).unwrap();

        assert!(session.is_completed());
        assert!(session.current_card().is_none());
    }

    #[test]
    fn test_missed_cards_repeat_in_next_round() {
        let scheduler = scheduler_with_due(&["apple", "pear"]);
        let mut session = ReviewSession::start(&scheduler, "1".into()).unwrap();
        assert_eq!(session.phase_message(), "Round 1: 2 cards");

        assert_eq!(session.current_card().unwrap().item_id.as_str(), "apple");
        session.grade_current_card(true, 1000.0).unwrap();
        assert_eq!(session.current_card().unwrap().item_id.as_str(), "pear");
        session.grade_current_card(false, 4000.0).unwrap();

        assert_eq!(session.round_number, 2);
        assert_eq!(session.remaining_count(), 1);
        assert_eq!(session.phase_message(), "Round 2 (Review): 1 cards to retry");
        assert_eq!(session.current_card().unwrap().item_id.as_str(), "pear");

        session.grade_current_card(true, 2000.0).unwrap();
        assert!(session.is_completed());
        assert_eq!(session.recalled_count(), 2);

        let pear = scheduler.get_card(&"1".into(), &"pear".into()).unwrap();
        assert_eq!(pear.total_reviews, 2);
        assert_eq!(pear.repetition_count, 1);
    }
}
