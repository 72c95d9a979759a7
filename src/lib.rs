pub mod model;
pub mod lp;
pub mod simplex;
pub mod config;
pub mod engine;
pub mod percentile;
pub mod evaluator;
pub mod loader;
pub mod popularity;

pub use config::EngineConfig;
pub use engine::{estimate_efficiency, DegenerateInput, EfficiencyEngine, EngineError};
pub use evaluator::{EvaluationError, PopularityEvaluator};
pub use loader::LoadError;
pub use lp::{Solver, SolveError};
pub use model::entity::{EntityRecord, Id};
pub use model::population::Population;
pub use model::score::{PercentileMap, ScoreMap};
pub use percentile::{rank, rank_with, RankError, TiePolicy};
pub use popularity::SocialPopularity;
pub use simplex::Simplex;
