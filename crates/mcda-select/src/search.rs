// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::scoring::{Dispersion, DispersionScorer};
use mcda_core::McdaError;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

const DEFAULT_MAX_COMBINATIONS: usize = 5000;

/// How k-attribute combinations are explored.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Forward selection: add the attribute that most improves the score.
    Greedy,
    /// Score every k-combination.
    Exhaustive,
    /// Exhaustive when `C(m, k) <= max_combinations`, greedy otherwise.
    Auto { max_combinations: usize },
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::Auto {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
        }
    }
}

impl SearchStrategy {
    pub fn validate(&self) -> Result<(), McdaError> {
        if let Self::Auto { max_combinations } = self
            && *max_combinations == 0
        {
            return Err(McdaError::invalid_input(
                "SearchStrategy::Auto requires max_combinations >= 1; got 0",
            ));
        }
        Ok(())
    }

    /// The concrete strategy used for `m` attributes and subsets of size `k`.
    pub fn resolve(self, m: usize, k: usize) -> ResolvedStrategy {
        match self {
            Self::Greedy => ResolvedStrategy::Greedy,
            Self::Exhaustive => ResolvedStrategy::Exhaustive,
            Self::Auto { max_combinations } => match binomial(m, k) {
                Some(count) if count <= max_combinations => ResolvedStrategy::Exhaustive,
                _ => ResolvedStrategy::Greedy,
            },
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedStrategy {
    Greedy,
    Exhaustive,
}

impl ResolvedStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Exhaustive => "exhaustive",
        }
    }
}

/// Whether the search looks for the best- or worst-separating subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDirection {
    Maximize,
    Minimize,
}

/// A scored attribute combination; `attributes` is ascending.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub attributes: Vec<usize>,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    pub selected: Candidate,
    pub strategy: ResolvedStrategy,
    pub evaluated: usize,
}

/// `C(m, k)`, or `None` on overflow.
pub fn binomial(m: usize, k: usize) -> Option<usize> {
    if k > m {
        return Some(0);
    }
    let k = k.min(m - k);
    let mut acc = 1usize;
    for i in 0..k {
        acc = acc.checked_mul(m - i)? / (i + 1);
    }
    Some(acc)
}

/// Preferred candidate first: score in search direction, then smaller index vector.
fn rank(a: &Candidate, b: &Candidate, direction: SearchDirection) -> Ordering {
    let by_score = match direction {
        SearchDirection::Maximize => b.score.total_cmp(&a.score),
        SearchDirection::Minimize => a.score.total_cmp(&b.score),
    };
    by_score.then_with(|| a.attributes.cmp(&b.attributes))
}

fn score_candidate<S: DispersionScorer + ?Sized>(
    scorer: &S,
    parts: &[Dispersion],
    attributes: Vec<usize>,
) -> Result<Candidate, McdaError> {
    let selected = attributes.iter().map(|&a| parts[a]).collect::<Vec<_>>();
    let score = scorer.combine(&selected);
    if !score.is_finite() {
        return Err(McdaError::numerical_issue(format!(
            "non-finite score {score} for attribute combination {attributes:?}"
        )));
    }
    Ok(Candidate { attributes, score })
}

fn score_all<S: DispersionScorer + ?Sized>(
    scorer: &S,
    parts: &[Dispersion],
    combos: Vec<Vec<usize>>,
    parallel: bool,
) -> Result<Vec<Candidate>, McdaError> {
    #[cfg(feature = "rayon")]
    if parallel {
        return combos
            .into_par_iter()
            .map(|attrs| score_candidate(scorer, parts, attrs))
            .collect();
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    combos
        .into_iter()
        .map(|attrs| score_candidate(scorer, parts, attrs))
        .collect()
}

/// Sorts with the declared tie-break and takes the head, independent of evaluation order.
fn pick(mut scored: Vec<Candidate>, direction: SearchDirection) -> Result<Candidate, McdaError> {
    scored.sort_by(|a, b| rank(a, b, direction));
    scored
        .into_iter()
        .next()
        .ok_or_else(|| McdaError::invalid_input("feature search produced no candidates"))
}

/// Lexicographic k-combinations of `0..m`.
fn combinations(m: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > m {
        return out;
    }
    let mut current = (0..k).collect::<Vec<_>>();
    loop {
        out.push(current.clone());
        let Some(pos) = (0..k).rev().find(|&i| current[i] < m - k + i) else {
            break;
        };
        current[pos] += 1;
        for i in pos + 1..k {
            current[i] = current[i - 1] + 1;
        }
    }
    out
}

/// Picks `k` of the attributes described by `parts`.
pub fn search<S: DispersionScorer + ?Sized>(
    scorer: &S,
    parts: &[Dispersion],
    k: usize,
    strategy: SearchStrategy,
    direction: SearchDirection,
    parallel: bool,
) -> Result<SearchOutcome, McdaError> {
    strategy.validate()?;
    let m = parts.len();
    if k == 0 || k > m {
        return Err(McdaError::invalid_k(k, m));
    }

    let resolved = strategy.resolve(m, k);
    match resolved {
        ResolvedStrategy::Exhaustive => {
            let combos = combinations(m, k);
            let evaluated = combos.len();
            let selected = pick(score_all(scorer, parts, combos, parallel)?, direction)?;
            Ok(SearchOutcome {
                selected,
                strategy: resolved,
                evaluated,
            })
        }
        ResolvedStrategy::Greedy => {
            let mut chosen = Vec::<usize>::with_capacity(k);
            let mut evaluated = 0usize;
            let mut selected = Candidate {
                attributes: vec![],
                score: 0.0,
            };
            for step in 0..k {
                let combos = (0..m)
                    .filter(|a| !chosen.contains(a))
                    .map(|a| {
                        let mut attrs = chosen.clone();
                        attrs.push(a);
                        attrs.sort_unstable();
                        attrs
                    })
                    .collect::<Vec<_>>();
                evaluated += combos.len();
                selected = pick(score_all(scorer, parts, combos, parallel)?, direction)?;
                chosen = selected.attributes.clone();
                debug!(
                    step,
                    ?direction,
                    attributes = ?chosen,
                    score = selected.score,
                    "greedy feature step"
                );
            }
            Ok(SearchOutcome {
                selected,
                strategy: resolved,
                evaluated,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ResolvedStrategy, SearchDirection, SearchStrategy, binomial, combinations, search,
    };
    use crate::scoring::{Dispersion, VarianceRatio};

    fn parts() -> Vec<Dispersion> {
        // ratios: 0 -> 1.0, 1 -> 9.0, 2 -> 0.25, 3 -> 4.0, 4 -> 1.0
        [(1.0, 1.0), (9.0, 1.0), (1.0, 4.0), (4.0, 1.0), (2.0, 2.0)]
            .into_iter()
            .map(|(between, within)| Dispersion { between, within })
            .collect()
    }

    #[test]
    fn binomial_and_combinations_agree() {
        assert_eq!(binomial(5, 2), Some(10));
        assert_eq!(binomial(8, 8), Some(1));
        assert_eq!(binomial(3, 4), Some(0));
        assert_eq!(binomial(200, 100), None);
        let combos = combinations(4, 2);
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], vec![0, 1]);
        assert_eq!(combos[5], vec![2, 3]);
    }

    #[test]
    fn auto_resolves_by_combination_count() {
        let auto = SearchStrategy::Auto {
            max_combinations: 10,
        };
        assert_eq!(auto.resolve(5, 2), ResolvedStrategy::Exhaustive);
        assert_eq!(auto.resolve(6, 2), ResolvedStrategy::Greedy);
        assert!(
            SearchStrategy::Auto {
                max_combinations: 0
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn exhaustive_best_and_worst() {
        let best = search(
            &VarianceRatio,
            &parts(),
            2,
            SearchStrategy::Exhaustive,
            SearchDirection::Maximize,
            false,
        )
        .expect("search");
        // {1, 3}: 13 / 2
        assert_eq!(best.selected.attributes, vec![1, 3]);
        assert_eq!(best.selected.score, 6.5);
        assert_eq!(best.evaluated, 10);

        let worst = search(
            &VarianceRatio,
            &parts(),
            2,
            SearchStrategy::Exhaustive,
            SearchDirection::Minimize,
            false,
        )
        .expect("search");
        // {0, 2}: 2 / 5
        assert_eq!(worst.selected.attributes, vec![0, 2]);
        assert_eq!(worst.selected.score, 0.4);
    }

    #[test]
    fn greedy_adds_best_attribute_each_step() {
        let outcome = search(
            &VarianceRatio,
            &parts(),
            2,
            SearchStrategy::Greedy,
            SearchDirection::Maximize,
            false,
        )
        .expect("search");
        assert_eq!(outcome.strategy, ResolvedStrategy::Greedy);
        assert_eq!(outcome.selected.attributes, vec![1, 3]);
        assert_eq!(outcome.evaluated, 5 + 4);
    }

    #[test]
    fn ties_go_to_smaller_index_vector() {
        let flat = vec![
            Dispersion {
                between: 1.0,
                within: 1.0
            };
            4
        ];
        for direction in [SearchDirection::Maximize, SearchDirection::Minimize] {
            let outcome = search(
                &VarianceRatio,
                &flat,
                2,
                SearchStrategy::default(),
                direction,
                false,
            )
            .expect("search");
            assert_eq!(outcome.selected.attributes, vec![0, 1]);
        }
    }

    #[test]
    fn parallel_scoring_matches_sequential() {
        for strategy in [SearchStrategy::Greedy, SearchStrategy::Exhaustive] {
            let a = search(
                &VarianceRatio,
                &parts(),
                4,
                strategy,
                SearchDirection::Maximize,
                false,
            )
            .expect("search");
            let b = search(
                &VarianceRatio,
                &parts(),
                4,
                strategy,
                SearchDirection::Maximize,
                true,
            )
            .expect("search");
            assert_eq!(a, b);
        }
    }

    #[test]
    fn k_above_attribute_count_is_invalid() {
        let err = search(
            &VarianceRatio,
            &parts(),
            8,
            SearchStrategy::Greedy,
            SearchDirection::Maximize,
            false,
        )
        .expect_err("8 of 5");
        assert_eq!(err.code(), "invalid_k");
    }
}
