use itertools::Itertools;
use thiserror::Error;

use crate::model::entity::Id;
use crate::model::score::{Percentile, PercentileMap, ScoreMap};

/// How entities sharing a score are ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TiePolicy {
    /// Every tied entity gets the best rank of its group.
    #[default]
    MinimumRank,
    /// Every tied entity gets the mean rank of its group.
    AverageRank,
}

impl TiePolicy {
    // `rank` is the 1-based rank of the group's first member.
    fn group_rank(self, rank: usize, ties: usize) -> f64 {
        match self {
            TiePolicy::MinimumRank => rank as f64,
            TiePolicy::AverageRank => (rank + (rank + ties - 1)) as f64 / 2.0,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RankError {
    #[error("cannot rank an empty score map")]
    Empty,
    #[error("entity {id} has a non-finite score")]
    NonFinite { id: Id },
}

/// Percentiles with the minimum-rank tie policy.
pub fn rank(scores: &ScoreMap) -> Result<PercentileMap, RankError> {
    rank_with(scores, TiePolicy::MinimumRank)
}

pub fn rank_with(scores: &ScoreMap, policy: TiePolicy) -> Result<PercentileMap, RankError> {
    if scores.is_empty() {
        return Err(RankError::Empty);
    }
    if let Some((id, _)) = scores.iter().find(|(_, score)| !score.is_finite()) {
        return Err(RankError::NonFinite { id: id.clone() });
    }

    let n = scores.len() as f64;
    let mut percentiles = PercentileMap::new();
    let mut rank = 1;
    let groups = scores.iter()
        .sorted_by(|a, b| b.1.total_cmp(a.1))
        .group_by(|(_, score)| **score);
    for (_, group) in &groups {
        let ids = group.map(|(id, _)| id.clone()).collect_vec();
        let ties = ids.len();
        let percentile: Percentile = 100.0 * (n - (policy.group_rank(rank, ties) - 1.0)) / n;
        percentiles.extend(ids.into_iter().map(|id| (id, percentile)));
        rank += ties;
    }
    Ok(percentiles)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;

    fn scores(values: &[(&str, f64)]) -> ScoreMap {
        values.iter().map(|(id, score)| (id.to_string(), *score)).collect()
    }

    #[test]
    fn distinct_scores_spread_evenly() {
        let percentiles = rank(&scores(&[("1", 1.0 / 3.0), ("2", 2.0 / 3.0), ("3", 1.0)])).unwrap();
        assert_eq!(percentiles["3"], 100.0);
        assert_abs_diff_eq!(percentiles["2"], 200.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(percentiles["1"], 100.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn ties_share_the_minimum_rank() {
        let input = scores(&[("a", 0.5), ("b", 0.5), ("c", 1.0), ("d", 0.1)]);
        let percentiles = rank(&input).unwrap();
        assert_eq!(percentiles["c"], 100.0);
        assert_eq!(percentiles["a"], 75.0);
        assert_eq!(percentiles["b"], 75.0);
        assert_eq!(percentiles["d"], 25.0);
    }

    #[test]
    fn ties_share_the_average_rank() {
        let input = scores(&[("a", 0.5), ("b", 0.5), ("c", 1.0), ("d", 0.1)]);
        let percentiles = rank_with(&input, TiePolicy::AverageRank).unwrap();
        assert_eq!(percentiles["c"], 100.0);
        assert_eq!(percentiles["a"], 62.5);
        assert_eq!(percentiles["b"], 62.5);
        assert_eq!(percentiles["d"], 25.0);
    }

    #[test]
    fn whole_frontier_ties_at_one_hundred() {
        let percentiles = rank(&scores(&[("a", 1.0), ("b", 1.0), ("c", 1.0)])).unwrap();
        assert!(percentiles.values().all(|p| *p == 100.0));
    }

    #[test]
    fn empty_map_is_an_error() {
        assert_eq!(rank(&ScoreMap::new()), Err(RankError::Empty));
    }

    #[test]
    fn nan_score_is_an_error() {
        assert_eq!(
            rank(&scores(&[("a", 1.0), ("b", f64::NAN)])),
            Err(RankError::NonFinite { id: "b".into() })
        );
    }

    proptest! {
        #[test]
        fn percentiles_follow_scores(values in prop::collection::vec(0u8..20, 1..40)) {
            let input: ScoreMap = values.iter().enumerate()
                .map(|(i, v)| (format!("{i:03}"), f64::from(*v) / 20.0))
                .collect();
            let percentiles = rank(&input).unwrap();
            let n = input.len() as f64;

            let max = percentiles.values().copied().fold(f64::MIN, f64::max);
            let min = percentiles.values().copied().fold(f64::MAX, f64::min);
            prop_assert_eq!(max, 100.0);
            prop_assert!(min >= 100.0 / n - 1e-9);

            for ((id_a, a), (id_b, b)) in input.iter().tuple_combinations() {
                if a == b {
                    prop_assert_eq!(percentiles[id_a], percentiles[id_b]);
                } else if a > b {
                    prop_assert!(percentiles[id_a] > percentiles[id_b]);
                } else {
                    prop_assert!(percentiles[id_a] < percentiles[id_b]);
                }
            }
        }
    }
}
