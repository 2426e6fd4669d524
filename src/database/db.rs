//! SQLite card store
//!
//! Handles database initialization, card CRUD and the simulated "current date"
//! used for trying out the schedule without waiting for real days to pass.

use super::CardStore;
use crate::error::{Result, SchedulerError};
use crate::models::{ItemId, OwnerId, ReviewCard};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const CARD_COLUMNS: &str = "owner_id, item_id, interval_days, repetition_count, ease_factor,
     next_review_at, last_reviewed_at, correct_streak, total_reviews, average_response_time_ms";

pub struct SqliteCardStore {
    conn: Mutex<Connection>,
}

impl SqliteCardStore {
    /// Opens (or creates) the database file and its tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        log::debug!("opened card database at {}", path.as_ref().display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_database(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Retrieves the simulated current date
    pub fn current_date(&self) -> Result<DateTime<Utc>> {
        current_date(&self.conn())
    }

    pub fn set_current_date(&self, date: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
            params![date.timestamp_millis().to_string()],
        )?;
        Ok(())
    }

    /// Advances the simulated date by 24 hours and returns the new date
    pub fn advance_day(&self) -> Result<DateTime<Utc>> {
        let next_day = self.current_date()? + Duration::days(1);
        self.set_current_date(next_day)?;
        Ok(next_day)
    }
}

/// Creates the card and app state tables.
/// Sets the simulated current date to now if not already initialized.
fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS review_cards (
            owner_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetition_count INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            next_review_at INTEGER NOT NULL,
            last_reviewed_at INTEGER NOT NULL,
            correct_streak INTEGER NOT NULL DEFAULT 0,
            total_reviews INTEGER NOT NULL DEFAULT 0,
            average_response_time_ms REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (owner_id, item_id)
        );
        CREATE INDEX IF NOT EXISTS idx_review_cards_due ON review_cards(owner_id, next_review_at);
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![Utc::now().timestamp_millis().to_string()],
    )?;

    Ok(())
}

fn current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;
    let millis = value
        .parse::<i64>()
        .map_err(|_| SchedulerError::Config(format!("corrupt current_date '{value}'")))?;
    DateTime::from_timestamp_millis(millis).ok_or(SchedulerError::InvalidTimestamp(millis))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

/// Drops sub-millisecond precision, which the INTEGER timestamp columns cannot hold.
fn truncate_to_millis(time: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let millis = time.timestamp_millis();
    DateTime::from_timestamp_millis(millis).ok_or(SchedulerError::InvalidTimestamp(millis))
}

/// The card exactly as it will read back from the table.
fn stored_form(mut card: ReviewCard) -> Result<ReviewCard> {
    card.next_review_at = truncate_to_millis(card.next_review_at)?;
    card.last_reviewed_at = truncate_to_millis(card.last_reviewed_at)?;
    Ok(card)
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewCard> {
    Ok(ReviewCard {
        owner_id: OwnerId(row.get(0)?),
        item_id: ItemId(row.get(1)?),
        interval_days: row.get(2)?,
        repetition_count: row.get(3)?,
        ease_factor: row.get(4)?,
        next_review_at: timestamp_column(row, 5)?,
        last_reviewed_at: timestamp_column(row, 6)?,
        correct_streak: row.get(7)?,
        total_reviews: row.get(8)?,
        average_response_time_ms: row.get(9)?,
    })
}

fn select_card(conn: &Connection, owner: &OwnerId, item: &ItemId) -> Result<Option<ReviewCard>> {
    let card = conn
        .query_row(
            &format!("SELECT {CARD_COLUMNS} FROM review_cards WHERE owner_id = ?1 AND item_id = ?2"),
            params![owner.as_str(), item.as_str()],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl CardStore for SqliteCardStore {
    fn insert(&self, card: ReviewCard) -> Result<ReviewCard> {
        let card = stored_form(card)?;
        let inserted = self.conn().execute(
            &format!("INSERT INTO review_cards ({CARD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                card.owner_id.as_str(),
                card.item_id.as_str(),
                card.interval_days,
                card.repetition_count,
                card.ease_factor,
                card.next_review_at.timestamp_millis(),
                card.last_reviewed_at.timestamp_millis(),
                card.correct_streak,
                card.total_reviews,
                card.average_response_time_ms,
            ],
        );

        match inserted {
            Ok(_) => Ok(card),
            Err(e) if is_constraint_violation(&e) => Err(SchedulerError::DuplicateCard {
                owner: card.owner_id,
                item: card.item_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, owner: &OwnerId, item: &ItemId) -> Result<Option<ReviewCard>> {
        select_card(&self.conn(), owner, item)
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<ReviewCard>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM review_cards WHERE owner_id = ?1"
        ))?;
        let cards = stmt
            .query_map(params![owner.as_str()], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    fn update_with(
        &self,
        owner: &OwnerId,
        item: &ItemId,
        apply: &dyn Fn(&ReviewCard) -> ReviewCard,
    ) -> Result<ReviewCard> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = select_card(&tx, owner, item)?.ok_or_else(|| SchedulerError::CardNotFound {
            owner: owner.clone(),
            item: item.clone(),
        })?;
        let updated = stored_form(apply(&current))?;

        tx.execute(
            "UPDATE review_cards
             SET interval_days = ?1, repetition_count = ?2, ease_factor = ?3,
                 next_review_at = ?4, last_reviewed_at = ?5, correct_streak = ?6,
                 total_reviews = ?7, average_response_time_ms = ?8
             WHERE owner_id = ?9 AND item_id = ?10",
            params![
                updated.interval_days,
                updated.repetition_count,
                updated.ease_factor,
                updated.next_review_at.timestamp_millis(),
                updated.last_reviewed_at.timestamp_millis(),
                updated.correct_streak,
                updated.total_reviews,
                updated.average_response_time_ms,
                owner.as_str(),
                item.as_str(),
            ],
        )?;
        tx.commit()?;

        Ok(updated)
    }

    fn owners(&self) -> Result<Vec<OwnerId>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT DISTINCT owner_id FROM review_cards ORDER BY owner_id")?;
        let owners = stmt
            .query_map([], |row| Ok(OwnerId(row.get(0)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(owners)
    }

    /// Cards due at `as_of`, ordered by due date (oldest first).
    fn due(&self, owner: &OwnerId, as_of: DateTime<Utc>) -> Result<Vec<ReviewCard>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM review_cards
             WHERE owner_id = ?1 AND next_review_at <= ?2
             ORDER BY next_review_at ASC, item_id ASC"
        ))?;
        let cards = stmt
            .query_map(
                params![owner.as_str(), as_of.timestamp_millis()],
                card_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleParams;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn card(owner: &str, item: &str) -> ReviewCard {
        ReviewCard::new(owner.into(), item.into(), created(), &ScheduleParams::default())
    }

    #[test]
    fn test_insert_get_roundtrip() {
        let store = SqliteCardStore::open_in_memory().unwrap();
        let mut original = card("1", "apple");
        original.average_response_time_ms = 1234.5;
        store.insert(original.clone()).unwrap();

        let loaded = store.get(&"1".into(), &"apple".into()).unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let store = SqliteCardStore::open_in_memory().unwrap();
        store.insert(card("1", "apple")).unwrap();

        let err = store.insert(card("1", "apple")).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateCard { .. }));
        // Same item for another learner is a different card
        assert!(store.insert(card("2", "apple")).is_ok());
    }

    #[test]
    fn test_update_with_persists() {
        let store = SqliteCardStore::open_in_memory().unwrap();
        store.insert(card("1", "apple")).unwrap();

        store
            .update_with(&"1".into(), &"apple".into(), &|c| ReviewCard {
                total_reviews: c.total_reviews + 1,
                ..c.clone()
            })
            .unwrap();

        let loaded = store.get(&"1".into(), &"apple".into()).unwrap().unwrap();
        assert_eq!(loaded.total_reviews, 1);
    }

    #[test]
    fn test_update_missing_card_fails() {
        let store = SqliteCardStore::open_in_memory().unwrap();
        let err = store
            .update_with(&"1".into(), &"apple".into(), &|c| c.clone())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::CardNotFound { .. }));
    }

    #[test]
    fn test_due_query_orders_and_filters() {
        let store = SqliteCardStore::open_in_memory().unwrap();
        let mut late = card("1", "zebra");
        late.next_review_at = created() + Duration::days(3);
        let mut early_b = card("1", "banana");
        early_b.next_review_at = created() - Duration::days(1);
        let mut early_a = card("1", "apple");
        early_a.next_review_at = created() - Duration::days(1);
        let mut earliest = card("1", "melon");
        earliest.next_review_at = created() - Duration::days(2);

        for c in [late, early_b, early_a, earliest] {
            store.insert(c).unwrap();
        }

        let due: Vec<String> = store
            .due(&"1".into(), created())
            .unwrap()
            .into_iter()
            .map(|c| c.item_id.0)
            .collect();
        assert_eq!(due, vec!["melon", "apple", "banana"]);
    }

    #[test]
    fn test_sub_millisecond_timestamps_read_back_unchanged() {
        let store = SqliteCardStore::open_in_memory().unwrap();
        let precise = created() + Duration::nanoseconds(1_234_567);
        let params = ScheduleParams::default();

        let inserted = store
            .insert(ReviewCard::new("1".into(), "apple".into(), precise, &params))
            .unwrap();
        assert_eq!(inserted.last_reviewed_at, created() + Duration::milliseconds(1));
        assert_eq!(
            store.get(&"1".into(), &"apple".into()).unwrap().unwrap(),
            inserted
        );

        // One nanosecond before the stored due date is still not due
        let as_of = inserted.next_review_at - Duration::nanoseconds(1);
        assert!(store.due(&"1".into(), as_of).unwrap().is_empty());
        assert_eq!(
            store.due(&"1".into(), inserted.next_review_at).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_simulated_date_advances() {
        let store = SqliteCardStore::open_in_memory().unwrap();
        store.set_current_date(created()).unwrap();

        let next = store.advance_day().unwrap();
        assert_eq!(next, created() + Duration::days(1));
        assert_eq!(store.current_date().unwrap(), next);
    }

    #[test]
    fn test_cards_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.sqlite3");

        {
            let store = SqliteCardStore::open(&path).unwrap();
            store.insert(card("1", "apple")).unwrap();
            store.set_current_date(created()).unwrap();
        }

        let store = SqliteCardStore::open(&path).unwrap();
        assert_eq!(store.list(&"1".into()).unwrap().len(), 1);
        assert_eq!(store.current_date().unwrap(), created());
        assert_eq!(store.owners().unwrap(), vec![OwnerId::from("1")]);
    }
}
