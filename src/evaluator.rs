use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{EfficiencyEngine, EngineError};
use crate::lp::Solver;
use crate::model::entity::{EntityRecord, Id, Measure};
use crate::model::population::Population;
use crate::model::score::Percentile;
use crate::percentile::{self, RankError};
use crate::simplex::Simplex;

const CANDIDATE_ID: &str = "__candidate";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    #[error("evaluation failed: {0}")]
    Failed(#[from] EngineError),
    #[error("evaluation failed: {0}")]
    Rank(#[from] RankError),
    #[error("candidate {0} missing from the ranking")]
    MissingCandidate(Id),
}

/// Scores single observations against a swappable reference population.
pub struct PopularityEvaluator<S = Simplex> {
    reference: ArcSwap<Population>,
    engine: EfficiencyEngine<S>,
}

impl Default for PopularityEvaluator<Simplex> {
    fn default() -> Self {
        PopularityEvaluator::new(EfficiencyEngine::default(), Population::new())
    }
}

impl<S: Solver> PopularityEvaluator<S> {
    pub fn new(engine: EfficiencyEngine<S>, reference: Population) -> Self {
        PopularityEvaluator { reference: ArcSwap::from_pointee(reference), engine }
    }

    pub fn reference(&self) -> Arc<Population> {
        self.reference.load_full()
    }

    pub fn load(&self, population: Population) {
        info!(records = population.len(), "reference population installed");
        self.reference.store(Arc::new(population));
    }

    /// Percentile of `candidate` (outputs only), rounded to two decimals.
    pub fn evaluate(&self, candidate: &[Measure]) -> Result<Percentile, EvaluationError> {
        let snapshot = self.reference.load_full();
        self.evaluate_against(&snapshot, candidate)
    }

    pub fn evaluate_against(
        &self,
        reference: &Population,
        candidate: &[Measure],
    ) -> Result<Percentile, EvaluationError> {
        let id = fresh_id(reference);
        let record = EntityRecord::outputs_only(id.clone(), candidate.to_vec());
        let augmented = reference.with_candidate(record);

        let scores = self.engine.score(&augmented)?;
        let percentiles = percentile::rank(&scores)?;
        let percentile = percentiles
            .get(&id)
            .copied()
            .ok_or_else(|| EvaluationError::MissingCandidate(id.clone()))?;

        let rounded = round_hundredths(percentile);
        debug!(candidate = %id, score = scores[&id], percentile = rounded, "candidate evaluated");
        Ok(rounded)
    }
}

fn fresh_id(reference: &Population) -> Id {
    let mut id = CANDIDATE_ID.to_string();
    let mut suffix = 0;
    while reference.contains(&id) {
        suffix += 1;
        id = format!("{CANDIDATE_ID}#{suffix}");
    }
    id
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
