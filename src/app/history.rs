use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::labels::Sentiment;

/// One successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub tweet: String,
    pub sentiment: Sentiment,
    /// Probability of `sentiment`, in `[0, 1]`.
    pub confidence: f32,
}

/// `0.97531` → `97.53%`.
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.2}%", confidence * 100.0)
}

#[derive(Tabled)]
struct HistoryRow<'a> {
    #[tabled(rename = "Tweet")]
    tweet: &'a str,
    #[tabled(rename = "Sentiment")]
    sentiment: &'a str,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Session-scoped analyses in insertion order. Unbounded.
#[derive(Debug, Default, Clone)]
pub struct History {
    records: Vec<AnalysisRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: AnalysisRecord) -> &AnalysisRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `None` while there is nothing to show.
    pub fn render_table(&self) -> Option<String> {
        if self.records.is_empty() {
            return None;
        }

        let rows = self.records.iter().map(|record| HistoryRow {
            tweet: &record.tweet,
            sentiment: record.sentiment.as_str(),
            confidence: format_confidence(record.confidence),
        });

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        Some(table.to_string())
    }
}
