//! Command handlers for the `review` binary.
//! Drives the scheduler against the SQLite store and the simulated current date.

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use review_scheduler::config::Config;
use review_scheduler::export::json::{export_json_to_path, import_json};
use review_scheduler::{
    ItemId, ManualClock, OwnerId, ReviewCard, ReviewScheduler, ReviewSession, SqliteCardStore,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Instant;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

pub struct App {
    scheduler: ReviewScheduler<SqliteCardStore, ManualClock>,
    owner: Option<OwnerId>,
    format: OutputFormat,
}

/// Formats a timestamp as YYYY-MM-DD HH:MM
fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

fn card_line(card: &ReviewCard) -> String {
    format!(
        "{:<20} next {}  interval {:>4}d  reps {:>2}  ease {:.2}  streak {:>2}  reviews {:>3}  avg {:.0}ms",
        card.item_id.as_str(),
        format_time(card.next_review_at),
        card.interval_days,
        card.repetition_count,
        card.ease_factor,
        card.correct_streak,
        card.total_reviews,
        card.average_response_time_ms,
    )
}

impl App {
    pub fn open(config: &Config, format: OutputFormat) -> anyhow::Result<Self> {
        let store = SqliteCardStore::open(&config.database)
            .with_context(|| format!("opening {}", config.database.display()))?;
        let clock = ManualClock::new(store.current_date()?);

        Ok(Self {
            scheduler: ReviewScheduler::with_params(store, clock, config.schedule.clone()),
            owner: config.owner.clone().map(OwnerId::from),
            format,
        })
    }

    fn owner(&self) -> anyhow::Result<&OwnerId> {
        match &self.owner {
            Some(owner) => Ok(owner),
            None => bail!("no learner selected: pass --owner or set `owner` in review.toml"),
        }
    }

    fn print_json(&self, value: &impl Serialize) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn print_cards(&self, cards: &[ReviewCard]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => self.print_json(&cards)?,
            OutputFormat::Plain => {
                if cards.is_empty() {
                    println!("No cards.");
                }
                for card in cards {
                    println!("{}", card_line(card));
                }
            }
        }
        Ok(())
    }

    pub fn add(&self, items: &[String]) -> anyhow::Result<()> {
        let owner = self.owner()?;
        let mut created = Vec::new();
        for item in items {
            created.push(self.scheduler.create_card(owner, &ItemId::from(item.as_str()))?);
        }
        self.print_cards(&created)
    }

    pub fn show(&self, item: &str) -> anyhow::Result<()> {
        let card = self.scheduler.get_card(self.owner()?, &item.into())?;
        self.print_cards(std::slice::from_ref(&card))
    }

    pub fn list(&self) -> anyhow::Result<()> {
        let mut cards = self.scheduler.list_cards(self.owner()?)?;
        cards.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        self.print_cards(&cards)
    }

    pub fn review(&self, item: &str, correct: bool, response_ms: f64) -> anyhow::Result<()> {
        let card = self
            .scheduler
            .submit_review(self.owner()?, &item.into(), correct, response_ms)?;
        self.print_cards(std::slice::from_ref(&card))
    }

    pub fn due(&self, as_of: Option<&str>) -> anyhow::Result<()> {
        let as_of = match as_of {
            Some(s) => DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("invalid --as-of timestamp '{s}'"))?
                .with_timezone(&Utc),
            None => self.scheduler.store().current_date()?,
        };
        let cards = self.scheduler.due_cards(self.owner()?, as_of)?;
        self.print_cards(&cards)
    }

    pub fn stats(&self) -> anyhow::Result<()> {
        let as_of = self.scheduler.store().current_date()?;
        let stats = self.scheduler.stats(self.owner()?, as_of)?;
        match self.format {
            OutputFormat::Json => self.print_json(&stats)?,
            OutputFormat::Plain => {
                println!("Date:            {}", format_time(as_of));
                println!("Cards:           {}", stats.total_cards);
                println!("Due:             {}", stats.due_cards);
                println!("Reviews:         {}", stats.total_reviews);
                println!("Mean ease:       {:.2}", stats.mean_ease_factor);
                println!("Avg response:    {:.0} ms", stats.average_response_time_ms);
                println!("Longest streak:  {}", stats.longest_streak);
            }
        }
        Ok(())
    }

    pub fn study(&self) -> anyhow::Result<()> {
        let mut session = ReviewSession::start(&self.scheduler, self.owner()?.clone())?;
        if session.is_completed() {
            println!("Nothing is due. Come back tomorrow or run `review next-day`.");
            return Ok(());
        }

        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        let mut last_round = 0;

        while let Some(card) = session.current_card() {
            if session.round_number != last_round {
                println!("{}", session.phase_message());
                last_round = session.round_number;
            }
            print!("Do you remember '{}'? [y/n/q] ", card.item_id);
            std::io::stdout().flush()?;

            let asked_at = Instant::now();
            let Some(line) = lines.next() else { break };
            let answer = line?;
            let elapsed_ms = asked_at.elapsed().as_secs_f64() * 1000.0;

            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => session.grade_current_card(true, elapsed_ms)?,
                "n" | "no" => session.grade_current_card(false, elapsed_ms)?,
                "q" | "quit" => break,
                _ => println!("Please answer y, n or q."),
            }
        }

        println!(
            "Recalled {} of {} cards.",
            session.recalled_count(),
            session.total_count()
        );
        Ok(())
    }

    pub fn next_day(&self) -> anyhow::Result<()> {
        let date = self.scheduler.store().advance_day()?;
        self.scheduler.clock().set(date);
        log::info!("simulated date is now {}", format_time(date));
        println!("{}", format_time(date));
        Ok(())
    }

    pub fn export(&self, path: &Path) -> anyhow::Result<()> {
        let cards = self.scheduler.list_cards(self.owner()?)?;
        export_json_to_path(&cards, path)?;
        println!("Exported {} cards to {}", cards.len(), path.display());
        Ok(())
    }

    pub fn import(&self, path: &Path) -> anyhow::Result<()> {
        let cards = import_json(path)?;
        let report = self.scheduler.import_cards(cards)?;
        println!(
            "Imported {} cards ({} already present)",
            report.imported, report.skipped
        );
        Ok(())
    }
}
