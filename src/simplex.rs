use std::time::Instant;

use crate::lp::{LinearProgram, Relation, Solution, SolveError, Solver};

// Consecutive degenerate pivots before switching to Bland's rule.
const STALL_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct Simplex {
    pub tolerance: f64,
    pub feasibility_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for Simplex {
    fn default() -> Self {
        Simplex {
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
            max_iterations: 100_000,
        }
    }
}

struct Budget {
    used: usize,
    limit: usize,
    deadline: Option<Instant>,
}

impl Budget {
    fn tick(&mut self) -> Result<(), SolveError> {
        if self.used >= self.limit {
            return Err(SolveError::IterationLimit { iterations: self.used });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(SolveError::Timeout);
            }
        }
        self.used += 1;
        Ok(())
    }
}

struct Tableau {
    rows: Vec<Vec<f64>>,
    // Reduced costs; the last cell holds the current objective value.
    objective: Vec<f64>,
    basis: Vec<usize>,
    width: usize,
    artificial_start: usize,
    tolerance: f64,
}

impl Tableau {
    fn build(program: &LinearProgram, tolerance: f64) -> Tableau {
        let n = program.n_variables();
        let normalized: Vec<(Vec<f64>, Relation, f64)> = program
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    (c.coefficients.iter().map(|a| -a).collect(), -c.relation, -c.rhs)
                } else {
                    (c.coefficients.clone(), c.relation, c.rhs)
                }
            })
            .collect();
        let n_slack = normalized.iter().filter(|(_, r, _)| *r != Relation::Equal).count();
        let n_artificial = normalized.iter().filter(|(_, r, _)| *r != Relation::LessEq).count();
        let artificial_start = n + n_slack;
        let width = artificial_start + n_artificial;

        let mut rows = Vec::with_capacity(normalized.len());
        let mut basis = Vec::with_capacity(normalized.len());
        let mut next_slack = n;
        let mut next_artificial = artificial_start;
        for (coefficients, relation, rhs) in normalized {
            let mut row = vec![0.0; width + 1];
            row[..n].copy_from_slice(&coefficients);
            row[width] = rhs;
            match relation {
                Relation::LessEq => {
                    row[next_slack] = 1.0;
                    basis.push(next_slack);
                    next_slack += 1;
                }
                Relation::GreaterEq => {
                    row[next_slack] = -1.0;
                    next_slack += 1;
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                Relation::Equal => {
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
            rows.push(row);
        }

        Tableau {
            rows,
            objective: vec![0.0; width + 1],
            basis,
            width,
            artificial_start,
            tolerance,
        }
    }

    fn has_artificials(&self) -> bool {
        self.width > self.artificial_start
    }

    fn objective_value(&self) -> f64 {
        self.objective[self.width]
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let width = self.width;
        let pivot = self.rows[row][col];
        self.rows[row].iter_mut().for_each(|value| *value /= pivot);
        let pivot_row = self.rows[row].clone();

        let eliminate = |target: &mut Vec<f64>| {
            let factor = target[col];
            if factor != 0.0 {
                for (value, p) in target.iter_mut().zip(&pivot_row) {
                    *value -= factor * p;
                }
                target[col] = 0.0;
            }
        };
        for (index, other) in self.rows.iter_mut().enumerate() {
            if index != row {
                eliminate(other);
                if other[width] < 0.0 && other[width] > -self.tolerance {
                    other[width] = 0.0;
                }
            }
        }
        eliminate(&mut self.objective);
        self.basis[row] = col;
    }

    fn entering(&self, columns: usize, bland: bool) -> Option<usize> {
        let mut improving = (0..columns).filter(|&j| self.objective[j] < -self.tolerance);
        if bland {
            improving.next()
        } else {
            improving.min_by(|&a, &b| self.objective[a].total_cmp(&self.objective[b]))
        }
    }

    /// Pivots until no column below `columns` has a negative reduced cost.
    fn optimize(&mut self, columns: usize, budget: &mut Budget) -> Result<(), SolveError> {
        let mut stalled = 0;
        loop {
            budget.tick()?;
            let Some(col) = self.entering(columns, stalled >= STALL_LIMIT) else {
                return Ok(());
            };
            let width = self.width;
            let leaving = self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row[col] > self.tolerance)
                .map(|(index, row)| (index, row[width] / row[col]))
                .min_by(|a, b| {
                    a.1.total_cmp(&b.1).then_with(|| self.basis[a.0].cmp(&self.basis[b.0]))
                });
            let Some((row, ratio)) = leaving else {
                return Err(SolveError::Unbounded);
            };
            if ratio > self.tolerance {
                stalled = 0;
            } else {
                stalled += 1;
            }
            self.pivot(row, col);
        }
    }

    fn phase_one(
        &mut self,
        budget: &mut Budget,
        feasibility_tolerance: f64,
    ) -> Result<(), SolveError> {
        let width = self.width;
        self.objective = vec![0.0; width + 1];
        self.objective[self.artificial_start..width].iter_mut().for_each(|d| *d = 1.0);
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            if basic >= self.artificial_start {
                self.objective.iter_mut().zip(row).for_each(|(d, a)| *d -= a);
            }
        }
        self.optimize(width, budget)?;
        if self.objective_value() < -feasibility_tolerance {
            return Err(SolveError::Infeasible);
        }

        // Artificials still basic sit at zero; swap them out where the row allows.
        for row in 0..self.rows.len() {
            if self.basis[row] < self.artificial_start {
                continue;
            }
            let replacement = (0..self.artificial_start)
                .find(|&j| self.rows[row][j].abs() > self.tolerance);
            if let Some(col) = replacement {
                self.pivot(row, col);
            }
        }
        Ok(())
    }

    fn phase_two(&mut self, costs: &[f64], budget: &mut Budget) -> Result<(), SolveError> {
        let width = self.width;
        self.objective = vec![0.0; width + 1];
        for (d, c) in self.objective.iter_mut().zip(costs) {
            *d = -c;
        }
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            let cost = costs.get(basic).copied().unwrap_or(0.0);
            if cost != 0.0 {
                self.objective.iter_mut().zip(row).for_each(|(d, a)| *d += cost * a);
            }
        }
        self.optimize(self.artificial_start, budget)
    }

    fn values(&self, n: usize) -> Vec<f64> {
        let mut values = vec![0.0; n];
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            if basic < n {
                values[basic] = row[self.width];
            }
        }
        values
    }
}

impl Solver for Simplex {
    fn solve(
        &self,
        program: &LinearProgram,
        deadline: Option<Instant>,
    ) -> Result<Solution, SolveError> {
        program.check()?;
        let mut budget = Budget { used: 0, limit: self.max_iterations, deadline };
        let mut tableau = Tableau::build(program, self.tolerance);
        if tableau.has_artificials() {
            tableau.phase_one(&mut budget, self.feasibility_tolerance)?;
        }
        tableau.phase_two(&program.objective, &mut budget)?;
        Ok(Solution {
            objective: tableau.objective_value(),
            values: tableau.values(program.n_variables()),
        })
    }
}
