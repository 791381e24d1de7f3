//! Local history of scored debates, kept in a JSON file.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::{dto::debate::DebateResponse, state::scoring::Outcome};

use super::error::HistoryError;

/// Summary of one finished debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Debate id.
    pub id: Uuid,
    /// When the debate was created.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Motion debated.
    pub topic: String,
    /// Team A display name.
    pub team_a_name: String,
    /// Team B display name.
    pub team_b_name: String,
    /// Outcome by evaluation totals.
    pub winner: Outcome,
    /// Team A total.
    pub team_a_score: i64,
    /// Team B total.
    pub team_b_score: i64,
    /// Total speaking time across recordings, in seconds.
    pub duration: u64,
    /// Free text written by the user.
    pub summary: String,
    /// Number of recordings.
    pub recordings_count: usize,
}

impl HistoryEntry {
    /// Entry for a debate as returned by the API.
    pub fn from_debate(debate: &DebateResponse, summary: impl Into<String>) -> Self {
        Self {
            id: debate.id,
            date: debate.created_at,
            topic: debate.config.debate_topic.clone(),
            team_a_name: debate.config.team_a_name.clone(),
            team_b_name: debate.config.team_b_name.clone(),
            winner: debate.total_score.winner,
            team_a_score: debate.total_score.team_a,
            team_b_score: debate.total_score.team_b,
            duration: debate
                .recordings
                .iter()
                .map(|recording| u64::try_from(recording.duration).unwrap_or(0))
                .sum(),
            summary: summary.into(),
            recordings_count: debate.recordings.len(),
        }
    }
}

/// History file plus its in-memory entries, newest addition first.
#[derive(Debug)]
pub struct DebateHistory {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl DebateHistory {
    /// Load the history stored at `path`. A missing file starts empty, and so does an
    /// unreadable one (after a warning).
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring corrupt debate history");
                Vec::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(HistoryError::Io { path, source }),
        };
        Ok(Self { path, entries })
    }

    /// Entries in insertion order, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Entry for a debate id.
    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries ordered by debate date, most recent first.
    pub fn sorted_by_date(&self) -> Vec<&HistoryEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    /// Prepend `entry` and persist.
    pub async fn add(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.insert(0, entry);
        self.persist().await
    }

    /// Remove the entry with `id`. Returns whether one was removed.
    pub async fn delete(&mut self, id: Uuid) -> Result<bool, HistoryError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    async fn persist(&self) -> Result<(), HistoryError> {
        let raw = serde_json::to_vec_pretty(&self.entries).map_err(HistoryError::Encode)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| HistoryError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|source| HistoryError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn entry(topic: &str, date: OffsetDateTime) -> HistoryEntry {
        HistoryEntry {
            id: Uuid::new_v4(),
            date,
            topic: topic.into(),
            team_a_name: "Atenas".into(),
            team_b_name: "Esparta".into(),
            winner: Outcome::A,
            team_a_score: 170,
            team_b_score: 160,
            duration: 1_680,
            summary: String::new(),
            recordings_count: 8,
        }
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("ciceron-history-{}", Uuid::new_v4()))
            .join("history.json")
    }

    #[tokio::test]
    async fn add_prepends_and_survives_reopen() {
        let path = temp_path();
        let mut history = DebateHistory::open(&path).await.unwrap();
        assert!(history.entries().is_empty());

        let first = entry("Primero", datetime!(2025-03-01 10:00 UTC));
        let second = entry("Segundo", datetime!(2025-02-01 10:00 UTC));
        history.add(first.clone()).await.unwrap();
        history.add(second.clone()).await.unwrap();
        assert_eq!(history.entries()[0].topic, "Segundo");

        let reopened = DebateHistory::open(&path).await.unwrap();
        assert_eq!(reopened.entries(), &[second, first.clone()]);
        assert_eq!(reopened.sorted_by_date()[0].topic, "Primero");
        assert_eq!(reopened.get(first.id), Some(&first));
    }

    #[tokio::test]
    async fn delete_reports_whether_an_entry_was_removed() {
        let path = temp_path();
        let mut history = DebateHistory::open(&path).await.unwrap();
        let kept = entry("Queda", datetime!(2025-01-01 0:00 UTC));
        history.add(kept.clone()).await.unwrap();

        assert!(!history.delete(Uuid::new_v4()).await.unwrap());
        assert!(history.delete(kept.id).await.unwrap());
        assert!(DebateHistory::open(&path).await.unwrap().get(kept.id).is_none());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(DebateHistory::open(&path).await.unwrap().entries().is_empty());
    }
}
