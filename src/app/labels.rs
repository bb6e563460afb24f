use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Display sentiment of an analysis.
///
/// `Other` keeps a raw model label that no mapping covers, unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
    Other(String),
}

impl Sentiment {
    /// Case-insensitive match on the three sentiment names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            "positive" => Some(Sentiment::Positive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
            Sentiment::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Raw model label → [`Sentiment`].
#[derive(Debug, Clone)]
pub struct LabelMap {
    entries: HashMap<String, Sentiment>,
}

impl LabelMap {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, raw: impl Into<String>, sentiment: Sentiment) {
        self.entries.insert(raw.into(), sentiment);
    }

    /// Default entries plus configured ones; configured values that are not a
    /// sentiment name are kept verbatim as `Other`.
    pub fn with_overrides<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut map = Self::default();
        for (raw, name) in overrides {
            let sentiment =
                Sentiment::from_name(name).unwrap_or_else(|| Sentiment::Other(name.clone()));
            map.insert(raw.clone(), sentiment);
        }
        map
    }

    /// Total: exact entry, then a sentiment name in any case, then the raw
    /// label itself.
    pub fn resolve(&self, raw: &str) -> Sentiment {
        if let Some(sentiment) = self.entries.get(raw) {
            return sentiment.clone();
        }
        Sentiment::from_name(raw).unwrap_or_else(|| Sentiment::Other(raw.to_string()))
    }
}

impl Default for LabelMap {
    /// The label codes a three-class fine-tune exports: `LABEL_0..2`.
    fn default() -> Self {
        let mut map = Self::empty();
        map.insert("LABEL_0", Sentiment::Negative);
        map.insert("LABEL_1", Sentiment::Neutral);
        map.insert("LABEL_2", Sentiment::Positive);
        map
    }
}
