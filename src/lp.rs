use std::ops::Neg;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    Equal,
    GreaterEq,
}

impl Neg for Relation {
    type Output = Self;

    // Relation after multiplying both sides by -1.
    fn neg(self) -> Self::Output {
        match self {
            Relation::LessEq => Relation::GreaterEq,
            Relation::Equal => Relation::Equal,
            Relation::GreaterEq => Relation::LessEq,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub coefficients: Vec<f64>,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, relation: Relation, rhs: f64) -> Constraint {
        Constraint { coefficients, relation, rhs }
    }
}

/// `maximize objective · x` subject to `constraints`, with every variable `x_j >= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    pub objective: Vec<f64>,
    pub constraints: Vec<Constraint>,
}

impl LinearProgram {
    pub fn new(objective: Vec<f64>) -> LinearProgram {
        LinearProgram { objective, constraints: Vec::new() }
    }

    pub fn subject_to(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    pub fn n_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn check(&self) -> Result<(), SolveError> {
        let expected = self.n_variables();
        for (row, constraint) in self.constraints.iter().enumerate() {
            let found = constraint.coefficients.len();
            if found != expected {
                return Err(SolveError::DimensionMismatch { row, expected, found });
            }
        }
        let all_finite = self
            .objective
            .iter()
            .chain(self.constraints.iter().flat_map(|c| c.coefficients.iter()))
            .chain(self.constraints.iter().map(|c| &c.rhs))
            .all(|value| value.is_finite());
        if all_finite { Ok(()) } else { Err(SolveError::NonFinite) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub objective: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolveError {
    #[error("linear program is infeasible")]
    Infeasible,
    #[error("linear program is unbounded")]
    Unbounded,
    #[error("no optimum after {iterations} pivots")]
    IterationLimit { iterations: usize },
    #[error("solve timed out")]
    Timeout,
    #[error("constraint {row} has {found} coefficients, expected {expected}")]
    DimensionMismatch { row: usize, expected: usize, found: usize },
    #[error("linear program contains a non-finite coefficient")]
    NonFinite,
}

pub trait Solver: Send + Sync {
    fn solve(
        &self,
        program: &LinearProgram,
        deadline: Option<Instant>,
    ) -> Result<Solution, SolveError>;
}
