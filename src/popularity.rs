use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use crate::evaluator::{EvaluationError, PopularityEvaluator};
use crate::loader::{self, LoadError};
use crate::model::population::Population;

/// Popularity of a page on a 0-100 percentile scale, from its social counts
/// compared against a knowledge base of other pages.
#[derive(Default)]
pub struct SocialPopularity {
    evaluator: PopularityEvaluator,
}

impl SocialPopularity {
    pub fn new() -> Self {
        SocialPopularity::default()
    }

    pub fn with_knowledge_base(knowledge_base: Population) -> Self {
        let popularity = SocialPopularity::new();
        popularity.evaluator.load(knowledge_base);
        popularity
    }

    pub fn knowledge_base(&self) -> Arc<Population> {
        self.evaluator.reference()
    }

    /// Replaces the knowledge base with the records in `path`. On error the
    /// previous knowledge base stays installed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize, LoadError> {
        Ok(self.install(loader::read_population_file(path)?))
    }

    pub fn load_reader<R: BufRead>(&self, reader: R) -> Result<usize, LoadError> {
        Ok(self.install(loader::read_population(reader)?))
    }

    fn install(&self, population: Population) -> usize {
        let n = population.len();
        self.evaluator.load(population);
        n
    }

    pub fn popularity(
        &self,
        likes: u64,
        shares: u64,
        mentions: u64,
    ) -> Result<f64, EvaluationError> {
        self.evaluator.evaluate(&[likes as f64, shares as f64, mentions as f64])
    }
}
