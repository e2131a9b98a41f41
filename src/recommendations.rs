//! Points a human auditor should look at, grouped by topic

use serde::Serialize;

/// Warnings raised under one topic
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Topic, e.g. "Third party"
    pub topic: String,
    /// What to check, without duplicates
    pub warnings: Vec<String>,
}

/// Topics in first-seen order, each with its deduplicated warnings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecommendationCollection {
    topics: Vec<Recommendation>,
}

impl RecommendationCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `warning` under `topic`
    pub fn add(&mut self, topic: &str, warning: &str) {
        match self.topics.iter_mut().find(|r| r.topic == topic) {
            Some(rec) => {
                if !rec.warnings.iter().any(|w| w == warning) {
                    rec.warnings.push(warning.to_string());
                }
            }
            None => self.topics.push(Recommendation {
                topic: topic.to_string(),
                warnings: vec![warning.to_string()],
            }),
        }
    }

    /// Topic names in first-seen order
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|r| r.topic.as_str())
    }

    /// Warnings recorded for `topic`
    pub fn warnings_for(&self, topic: &str) -> &[String] {
        self.topics
            .iter()
            .find(|r| r.topic == topic)
            .map(|r| r.warnings.as_slice())
            .unwrap_or_default()
    }

    /// All recommendations
    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.topics.iter()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Owned copy of the recommendations, for the report
    pub fn to_vec(&self) -> Vec<Recommendation> {
        self.topics.clone()
    }
}
