use std::iter;
use std::time::Instant;

use itertools::Itertools;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug_span, trace, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::lp::{Constraint, LinearProgram, Relation, SolveError, Solver};
use crate::model::entity::{EntityRecord, Id, Measure, MeasureKind};
use crate::model::population::Population;
use crate::model::score::{Score, ScoreMap};
use crate::simplex::Simplex;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DegenerateInput {
    #[error("population has {found} entities, at least 2 are required")]
    TooFewEntities { found: usize },
    #[error("entities have no output measures")]
    NoOutputs,
    #[error("entity {id} has {found} {measure} values, expected {expected}")]
    ShapeMismatch {
        id: Id,
        measure: MeasureKind,
        expected: usize,
        found: usize,
    },
    #[error("entity {id} has a negative or non-finite {measure} at position {index}")]
    InvalidMeasure {
        id: Id,
        measure: MeasureKind,
        index: usize,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("degenerate input: {0}")]
    Degenerate(#[from] DegenerateInput),
    #[error("solver failed for entity {id}: {source}")]
    Solver {
        id: Id,
        #[source]
        source: SolveError,
    },
}

// Validated, column-normalized view of a population, rows in id order.
struct Frame<'a> {
    ids: Vec<&'a Id>,
    outputs: Vec<Vec<Measure>>,
    inputs: Vec<Vec<Measure>>,
    synthetic_input: bool,
}

impl<'a> Frame<'a> {
    fn prepare(
        population: &'a Population,
        normalize: bool,
    ) -> Result<Frame<'a>, DegenerateInput> {
        let records = population.records().collect_vec();
        if records.len() < 2 {
            return Err(DegenerateInput::TooFewEntities { found: records.len() });
        }
        let n_outputs = records[0].outputs.len();
        let n_inputs = records[0].inputs.len();
        if n_outputs == 0 {
            return Err(DegenerateInput::NoOutputs);
        }
        for record in &records {
            check_measures(record, MeasureKind::Output, n_outputs)?;
            check_measures(record, MeasureKind::Input, n_inputs)?;
        }

        // Pure-output populations get a constant unit input.
        let synthetic_input = n_inputs == 0;
        let mut outputs = records.iter().map(|r| r.outputs.clone()).collect_vec();
        let mut inputs = if synthetic_input {
            vec![vec![1.0]; records.len()]
        } else {
            records.iter().map(|r| r.inputs.clone()).collect_vec()
        };
        if normalize {
            normalize_columns(&mut outputs);
            normalize_columns(&mut inputs);
        }

        Ok(Frame {
            ids: records.iter().map(|&r| &r.id).collect(),
            outputs,
            inputs,
            synthetic_input,
        })
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn n_outputs(&self) -> usize {
        self.outputs[0].len()
    }

    fn n_inputs(&self) -> usize {
        self.inputs[0].len()
    }
}

fn check_measures(
    record: &EntityRecord,
    kind: MeasureKind,
    expected: usize,
) -> Result<(), DegenerateInput> {
    let values = record.measures(kind);
    if values.len() != expected {
        return Err(DegenerateInput::ShapeMismatch {
            id: record.id.clone(),
            measure: kind,
            expected,
            found: values.len(),
        });
    }
    match values.iter().position(|v| !(v.is_finite() && *v >= 0.0)) {
        Some(index) => Err(DegenerateInput::InvalidMeasure {
            id: record.id.clone(),
            measure: kind,
            index,
        }),
        None => Ok(()),
    }
}

fn normalize_columns(rows: &mut [Vec<Measure>]) {
    let width = rows.first().map_or(0, Vec::len);
    for column in 0..width {
        let max = rows.iter().map(|row| row[column]).fold(0.0, f64::max);
        if max > 0.0 {
            rows.iter_mut().for_each(|row| row[column] /= max);
        }
    }
}

fn unit(index: usize, len: usize, value: f64) -> impl Iterator<Item = f64> {
    (0..len).map(move |i| if i == index { value } else { 0.0 })
}

// Envelopment form: min θ - ε(Σs⁻ + Σs⁺) s.t. Σλx + s⁻ = θx_o, Σλy - s⁺ = y_o.
// Variables: θ, λ per entity, s⁻ per input, s⁺ per output. Negated for the
// maximizing solver, so score = -optimum.
fn formulate(frame: &Frame, target: usize, epsilon: f64) -> LinearProgram {
    let (n, n_inputs, n_outputs) = (frame.len(), frame.n_inputs(), frame.n_outputs());

    let objective = iter::once(-1.0)
        .chain(iter::repeat(0.0).take(n))
        .chain(iter::repeat(epsilon).take(n_inputs + n_outputs))
        .collect();
    let mut program = LinearProgram::new(objective);

    for i in 0..n_inputs {
        let coefficients = iter::once(-frame.inputs[target][i])
            .chain(frame.inputs.iter().map(|x| x[i]))
            .chain(unit(i, n_inputs, 1.0))
            .chain(iter::repeat(0.0).take(n_outputs))
            .collect();
        program.subject_to(Constraint::new(coefficients, Relation::Equal, 0.0));
    }
    for k in 0..n_outputs {
        let coefficients = iter::once(0.0)
            .chain(frame.outputs.iter().map(|y| y[k]))
            .chain(iter::repeat(0.0).take(n_inputs))
            .chain(unit(k, n_outputs, -1.0))
            .collect();
        let rhs = frame.outputs[target][k];
        program.subject_to(Constraint::new(coefficients, Relation::Equal, rhs));
    }
    program
}

// Clamps into [0, 1] and rounds onto the `tolerance` grid so that scores equal
// up to rounding noise compare equal.
fn snap(raw: f64, tolerance: f64) -> Score {
    let clamped = raw.clamp(0.0, 1.0);
    if 1.0 - clamped <= tolerance {
        return 1.0;
    }
    if tolerance == 0.0 {
        return clamped;
    }
    ((clamped / tolerance).round() * tolerance).min(1.0)
}

pub struct EfficiencyEngine<S = Simplex> {
    config: EngineConfig,
    solver: S,
}

impl EfficiencyEngine<Simplex> {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        EfficiencyEngine::with_solver(config, Simplex::default())
    }
}

impl Default for EfficiencyEngine<Simplex> {
    fn default() -> Self {
        EfficiencyEngine {
            config: EngineConfig::default(),
            solver: Simplex::default(),
        }
    }
}

impl<S: Solver> EfficiencyEngine<S> {
    pub fn with_solver(config: EngineConfig, solver: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(EfficiencyEngine { config, solver })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fails as a whole if any single solve fails.
    pub fn score(&self, population: &Population) -> Result<ScoreMap, EngineError> {
        let frame = Frame::prepare(population, self.config.normalize)?;
        let _span = debug_span!(
            "efficiency",
            entities = frame.len(),
            outputs = frame.n_outputs(),
            inputs = frame.n_inputs(),
            synthetic_input = frame.synthetic_input
        )
        .entered();

        let solve = |target: usize| self.solve_entity(&frame, target);
        let scores: Vec<(Id, Score)> = if self.config.parallel {
            (0..frame.len()).into_par_iter().map(solve).collect::<Result<_, _>>()?
        } else {
            (0..frame.len()).map(solve).collect::<Result<_, _>>()?
        };
        Ok(scores.into_iter().collect())
    }

    fn solve_entity(&self, frame: &Frame, target: usize) -> Result<(Id, Score), EngineError> {
        let id = frame.ids[target];
        let program = formulate(frame, target, self.config.epsilon);
        let deadline = self
            .config
            .solve_timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));

        let solution = self.solver.solve(&program, deadline).map_err(|source| {
            warn!(entity = %id, error = %source, "efficiency solve failed");
            EngineError::Solver { id: id.clone(), source }
        })?;

        let raw = -solution.objective;
        if raw > 1.0 + self.config.frontier_tolerance {
            warn!(entity = %id, raw, "score above the frontier, clamping");
        }
        let score = snap(raw, self.config.frontier_tolerance);
        trace!(entity = %id, score, "solved");
        Ok((id.clone(), score))
    }
}

pub fn estimate_efficiency(population: &Population) -> Result<ScoreMap, EngineError> {
    EfficiencyEngine::<Simplex>::default().score(population)
}
