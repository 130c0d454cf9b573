//! # Prediction Book
//!
//! Append-only storage for issued predictions and their outcomes.
//!
//! A prediction is never modified after [`PredictionBook::issue`]. Issuing a
//! new prediction for an existing [`PredictionKey`] links it to the current
//! head through `supersedes` and moves the head; the old record stays
//! readable. Outcomes live beside predictions, at most one per prediction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use radar_core::{Prediction, PredictionKey, PredictionOutcome, PredictionStatus};
use uuid::Uuid;

use crate::error::ForecastError;
use crate::outcome::{score_outcome, ModelPerformance};

/// Issued predictions, supersession heads and recorded outcomes.
#[derive(Debug, Default, Clone)]
pub struct PredictionBook {
    records: Vec<Prediction>,
    index: HashMap<Uuid, usize>,
    heads: HashMap<PredictionKey, Uuid>,
    outcomes: HashMap<Uuid, PredictionOutcome>,
}

impl PredictionBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records. Predictions are replayed oldest
    /// first; stored `supersedes` links are kept as they are.
    pub fn restore(mut predictions: Vec<Prediction>, outcomes: Vec<PredictionOutcome>) -> Self {
        predictions.sort_by_key(|p| p.created_at);
        let mut book = Self::new();
        for prediction in predictions {
            if book.index.contains_key(&prediction.id) {
                tracing::warn!(
                    prediction_id = %prediction.id,
                    "duplicate prediction skipped on restore"
                );
                continue;
            }
            book.heads.insert(prediction.key(), prediction.id);
            book.index.insert(prediction.id, book.records.len());
            book.records.push(prediction);
        }
        for outcome in outcomes {
            if book.index.contains_key(&outcome.prediction_id) {
                book.outcomes.entry(outcome.prediction_id).or_insert(outcome);
            } else {
                tracing::warn!(
                    prediction_id = %outcome.prediction_id,
                    "orphan outcome skipped on restore"
                );
            }
        }
        book
    }

    /// Store a new prediction, linking it to the current head for its key.
    pub fn issue(&mut self, mut prediction: Prediction) -> Result<&Prediction, ForecastError> {
        if self.index.contains_key(&prediction.id) {
            return Err(ForecastError::DuplicatePrediction(prediction.id));
        }
        let key = prediction.key();
        prediction.supersedes = self.heads.get(&key).copied();
        prediction.status = PredictionStatus::Completed;
        prediction.updated_at = prediction.created_at;

        let id = prediction.id;
        let slot = self.records.len();
        tracing::debug!(
            prediction_id = %id,
            prediction_type = prediction.prediction_type.as_str(),
            supersedes = ?prediction.supersedes,
            "prediction issued"
        );
        self.heads.insert(key, id);
        self.index.insert(id, slot);
        self.records.push(prediction);
        Ok(&self.records[slot])
    }

    /// Score and append the outcome for a prediction.
    pub fn record_outcome(
        &mut self,
        prediction_id: Uuid,
        actual: f64,
        observed_at: DateTime<Utc>,
        outcome_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&PredictionOutcome, ForecastError> {
        let prediction = self
            .get(prediction_id)
            .ok_or(ForecastError::PredictionNotFound(prediction_id))?;
        if self.outcomes.contains_key(&prediction_id) {
            return Err(ForecastError::DuplicateOutcome(prediction_id));
        }
        let outcome = score_outcome(prediction, actual, observed_at, outcome_id, now)?;
        Ok(self.outcomes.entry(prediction_id).or_insert(outcome))
    }

    /// Prediction by ID.
    pub fn get(&self, id: Uuid) -> Option<&Prediction> {
        self.index.get(&id).map(|&i| &self.records[i])
    }

    /// Every prediction, in issue order.
    pub fn list(&self) -> &[Prediction] {
        &self.records
    }

    /// Heads of all supersession chains, in issue order.
    pub fn current(&self) -> Vec<&Prediction> {
        self.records
            .iter()
            .filter(|p| self.is_current(p.id))
            .collect()
    }

    /// Whether `id` is the head of its chain.
    pub fn is_current(&self, id: Uuid) -> bool {
        self.get(id)
            .is_some_and(|p| self.heads.get(&p.key()) == Some(&id))
    }

    /// Chain ending at `id`, newest first.
    pub fn chain(&self, id: Uuid) -> Vec<&Prediction> {
        let mut out = Vec::new();
        let mut cursor = self.get(id);
        while let Some(p) = cursor {
            out.push(p);
            cursor = p.supersedes.and_then(|prev| self.get(prev));
        }
        out
    }

    /// Outcome recorded for a prediction.
    pub fn outcome_for(&self, prediction_id: Uuid) -> Option<&PredictionOutcome> {
        self.outcomes.get(&prediction_id)
    }

    /// Every recorded outcome.
    pub fn outcomes(&self) -> impl Iterator<Item = &PredictionOutcome> {
        self.outcomes.values()
    }

    /// Accuracy tracking for one model.
    pub fn performance(&self, model_id: Uuid) -> ModelPerformance {
        let issued: Vec<&Prediction> = self
            .records
            .iter()
            .filter(|p| p.model_id == model_id)
            .collect();
        let scored: Vec<&PredictionOutcome> = issued
            .iter()
            .filter_map(|p| self.outcomes.get(&p.id))
            .collect();
        ModelPerformance::from_outcomes(model_id, issued.len(), &scored)
    }

    /// Mean interval hit rate over every scored prediction.
    pub fn overall_hit_rate(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let hits = self.outcomes.values().filter(|o| o.within_interval).count();
        Some(hits as f64 / self.outcomes.len() as f64)
    }

    /// Number of predictions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the book holds no predictions.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::tests::prediction;
    use chrono::Duration;

    #[test]
    fn second_issue_supersedes_first() {
        let mut book = PredictionBook::new();
        let first = prediction(10.0, 5.0, 15.0);
        let mut second = prediction(12.0, 6.0, 18.0);
        second.created_at = first.created_at + Duration::days(1);
        let first_id = first.id;
        let second_id = second.id;

        assert!(book.issue(first).unwrap().supersedes.is_none());
        assert_eq!(book.issue(second).unwrap().supersedes, Some(first_id));

        assert_eq!(book.len(), 2);
        assert!(book.is_current(second_id));
        assert!(!book.is_current(first_id));
        assert_eq!(book.current().len(), 1);
        let chain: Vec<Uuid> = book.chain(second_id).iter().map(|p| p.id).collect();
        assert_eq!(chain, vec![second_id, first_id]);
        // The superseded record is unchanged.
        assert_eq!(book.get(first_id).unwrap().predicted_value, 10.0);
    }

    #[test]
    fn different_jurisdiction_is_separate_chain() {
        let mut book = PredictionBook::new();
        let a = prediction(1.0, 0.0, 2.0);
        let mut b = prediction(1.0, 0.0, 2.0);
        b.target_jurisdiction = radar_core::JurisdictionCode::new("EU").unwrap();
        book.issue(a).unwrap();
        assert!(book.issue(b).unwrap().supersedes.is_none());
        assert_eq!(book.current().len(), 2);
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut book = PredictionBook::new();
        let p = prediction(1.0, 0.0, 2.0);
        book.issue(p.clone()).unwrap();
        assert!(matches!(book.issue(p), Err(ForecastError::DuplicatePrediction(_))));
    }

    #[test]
    fn one_outcome_per_prediction() {
        let mut book = PredictionBook::new();
        let p = prediction(100.0, 90.0, 110.0);
        let id = p.id;
        book.issue(p).unwrap();
        let now = Utc::now();
        let o = book.record_outcome(id, 95.0, now, Uuid::new_v4(), now).unwrap();
        assert!(o.within_interval);
        assert!(matches!(
            book.record_outcome(id, 95.0, now, Uuid::new_v4(), now),
            Err(ForecastError::DuplicateOutcome(_))
        ));
        assert!(matches!(
            book.record_outcome(Uuid::new_v4(), 1.0, now, Uuid::new_v4(), now),
            Err(ForecastError::PredictionNotFound(_))
        ));
        assert_eq!(book.get(id).unwrap().predicted_value, 100.0);
        assert_eq!(book.overall_hit_rate(), Some(1.0));
    }

    #[test]
    fn performance_counts_model_predictions() {
        let mut book = PredictionBook::new();
        let p = prediction(100.0, 90.0, 110.0);
        let model = p.model_id;
        let id = p.id;
        book.issue(p).unwrap();
        book.issue(prediction(50.0, 40.0, 60.0)).unwrap();
        let now = Utc::now();
        book.record_outcome(id, 200.0, now, Uuid::new_v4(), now).unwrap();
        let perf = book.performance(model);
        assert_eq!(perf.predictions, 2);
        assert_eq!(perf.outcomes, 1);
        assert_eq!(perf.hit_rate, Some(0.0));
    }

    #[test]
    fn restore_rebuilds_heads() {
        let first = prediction(10.0, 5.0, 15.0);
        let mut second = prediction(12.0, 6.0, 18.0);
        second.created_at = first.created_at + Duration::days(1);
        second.supersedes = Some(first.id);
        let second_id = second.id;
        let book = PredictionBook::restore(vec![second, first], vec![]);
        assert!(book.is_current(second_id));
        assert_eq!(book.current().len(), 1);
    }
}
