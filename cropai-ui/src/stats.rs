//! History statistics
//!
//! Derived view over a session's analysis history. Pure; recomputed on every
//! render.

use cropai_common::models::AnalysisRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Diseases listed in the ranking
pub const TOP_DISEASE_LIMIT: usize = 5;
/// Records listed as recent
pub const RECENT_LIMIT: usize = 5;

/// One row of the most-detected ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseCount {
    pub disease: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStatistics {
    pub total: usize,
    pub average_confidence: f64,
    /// Distinct disease labels across the whole history
    pub unique_diseases: usize,
    pub top_diseases: Vec<DiseaseCount>,
    pub recent: Vec<AnalysisRecord>,
}

impl HistoryStatistics {
    /// Compute statistics; `None` when there is nothing to show
    pub fn compute(history: &[AnalysisRecord]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }

        let frequencies = disease_frequencies(history);
        let unique_diseases = frequencies.len();

        Some(Self {
            total: history.len(),
            average_confidence: average_confidence(history),
            unique_diseases,
            top_diseases: frequencies.into_iter().take(TOP_DISEASE_LIMIT).collect(),
            recent: history.iter().take(RECENT_LIMIT).cloned().collect(),
        })
    }

    /// Average confidence with one decimal, e.g. `70.0`
    pub fn average_display(&self) -> String {
        format!("{:.1}", self.average_confidence)
    }
}

/// Arithmetic mean of confidence, 0 when empty
pub fn average_confidence(history: &[AnalysisRecord]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let sum: f64 = history.iter().map(|r| r.confidence).sum();
    sum / history.len() as f64
}

/// Count per disease, descending; ties keep first-occurrence order
pub fn disease_frequencies(history: &[AnalysisRecord]) -> Vec<DiseaseCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<DiseaseCount> = Vec::new();

    for record in history {
        match index.get(record.disease_detected.as_str()).copied() {
            Some(i) => counts[i].count += 1,
            None => {
                index.insert(record.disease_detected.as_str(), counts.len());
                counts.push(DiseaseCount {
                    disease: record.disease_detected.clone(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn records(entries: &[(&str, f64)]) -> Vec<AnalysisRecord> {
        let now = Utc::now();
        entries
            .iter()
            .enumerate()
            .map(|(i, (disease, confidence))| AnalysisRecord {
                id: format!("r{}", i),
                disease_detected: disease.to_string(),
                confidence: *confidence,
                analyzed_at: now - Duration::minutes(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_empty_history_renders_nothing() {
        assert!(HistoryStatistics::compute(&[]).is_none());
        assert_eq!(average_confidence(&[]), 0.0);
    }

    #[test]
    fn test_average_confidence_one_decimal() {
        let history = records(&[("A", 80.0), ("B", 60.0), ("C", 70.0)]);
        let stats = HistoryStatistics::compute(&history).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average_display(), "70.0");
    }

    #[test]
    fn test_ties_broken_by_first_occurrence() {
        let history = records(&[
            ("A", 90.0),
            ("B", 90.0),
            ("A", 90.0),
            ("C", 90.0),
            ("B", 90.0),
            ("A", 90.0),
            ("B", 90.0),
        ]);
        let ranked: Vec<(String, usize)> = disease_frequencies(&history)
            .into_iter()
            .map(|d| (d.disease, d.count))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("A".to_string(), 3),
                ("B".to_string(), 3),
                ("C".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_top_and_recent_truncated_to_five() {
        let history = records(&[
            ("A", 50.0),
            ("B", 50.0),
            ("C", 50.0),
            ("D", 50.0),
            ("E", 50.0),
            ("F", 50.0),
            ("G", 50.0),
        ]);
        let stats = HistoryStatistics::compute(&history).unwrap();
        assert_eq!(stats.top_diseases.len(), TOP_DISEASE_LIMIT);
        assert_eq!(stats.unique_diseases, 7);
        let recent_ids: Vec<&str> = stats.recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(recent_ids, vec!["r0", "r1", "r2", "r3", "r4"]);
    }
}
