//! JSON import/export of review cards.
//! Saves and loads a learner's scheduling state as a pretty-printed JSON array.

use crate::error::Result;
use crate::models::ReviewCard;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub fn export_cards(cards: &[ReviewCard], writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(writer, cards)?;
    Ok(())
}

pub fn import_cards(reader: impl Read) -> Result<Vec<ReviewCard>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Exports cards to a JSON file at the specified path.
pub fn export_json_to_path(cards: &[ReviewCard], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    export_cards(cards, &mut writer)?;
    writer.flush()?;
    log::info!("exported {} cards to {}", cards.len(), path.as_ref().display());
    Ok(())
}

/// Reads cards from a JSON file.
/// Fails if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: impl AsRef<Path>) -> Result<Vec<ReviewCard>> {
    let cards = import_cards(BufReader::new(File::open(path.as_ref())?))?;
    log::debug!("read {} cards from {}", cards.len(), path.as_ref().display());
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;
    use crate::models::ScheduleParams;
    use chrono::{TimeZone, Utc};
    use std::fs;

    fn create_test_cards() -> Vec<ReviewCard> {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let params = ScheduleParams::default();
        vec![
            ReviewCard::new("1".into(), "hello".into(), created, &params),
            ReviewCard::new("1".into(), "goodbye".into(), created, &params),
        ]
    }

    #[test]
    fn test_export_and_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        let original = create_test_cards();

        export_json_to_path(&original, &path).unwrap();
        assert!(fs::metadata(&path).is_ok(), "File should exist");

        let imported = import_json(&path).unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn test_import_hand_written_json() {
        let json_content = r#"[
  {
    "owner_id": "7",
    "item_id": "apple",
    "interval_days": 6,
    "repetition_count": 2,
    "ease_factor": 2.7,
    "next_review_at": "2024-03-08T09:00:00Z",
    "last_reviewed_at": "2024-03-02T09:00:00Z",
    "correct_streak": 2,
    "total_reviews": 2,
    "average_response_time_ms": 1800.0
  }
]"#;

        let cards = import_cards(json_content.as_bytes()).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].owner_id.as_str(), "7");
        assert_eq!(cards[0].interval_days, 6);
        assert!(cards[0].validate(&ScheduleParams::default()).is_ok());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let err = import_json("nonexistent_file_xyz123.json").unwrap_err();
        assert!(matches!(err, SchedulerError::Io(_)));
    }

    #[test]
    fn test_import_invalid_json() {
        let err = import_cards("{ this is not valid json }".as_bytes()).unwrap_err();
        assert!(matches!(err, SchedulerError::Json(_)));
    }
}
