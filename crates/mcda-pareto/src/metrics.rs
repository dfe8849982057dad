// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Front quality metrics over oriented objective vectors.

use crate::dominance::non_dominated_indices;

/// Distance of the hypervolume reference point beyond the worst normalized value.
pub const DEFAULT_REFERENCE_OFFSET: f64 = 0.1;
/// Largest objective count for which the hypervolume is computed exactly.
pub const DEFAULT_EXACT_HYPERVOLUME_MAX_OBJECTIVES: usize = 3;
pub const DEFAULT_MONTE_CARLO_SAMPLES: usize = 10_000;
pub const DEFAULT_MONTE_CARLO_SEED: u64 = 0x6d63_6461_5f68_7676;

/// How [`ParetoMetrics::hypervolume`] was obtained.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HypervolumeMethod {
    Exact,
    /// Fraction of seeded uniform samples in the front's bounding box that
    /// the front dominates, times the box volume.
    MonteCarlo { samples: usize, seed: u64 },
}

impl HypervolumeMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::MonteCarlo { .. } => "monte_carlo",
        }
    }

    pub fn compute(self, points: &[Vec<f64>], reference: &[f64]) -> f64 {
        match self {
            Self::Exact => hypervolume(points, reference),
            Self::MonteCarlo { samples, seed } => {
                hypervolume_monte_carlo(points, reference, samples, seed)
            }
        }
    }
}

/// Summary of a Pareto front's size and spread.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParetoMetrics {
    pub front_size: usize,
    pub record_count: usize,
    /// Dominated volume of the normalized front, bounded by `reference_point`.
    pub hypervolume: f64,
    pub hypervolume_method: HypervolumeMethod,
    pub reference_point: Vec<f64>,
    /// Schott spacing; `None` for fronts with fewer than two members.
    pub spacing: Option<f64>,
    /// Raw `max - min` of each objective over the front.
    pub extent: Vec<f64>,
}

/// Min-max scales every column to `[0, 1]`; constant columns map to 0.5.
pub fn normalize_columns(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(first) = points.first() else {
        return vec![];
    };
    let dims = first.len();
    let bounds = (0..dims)
        .map(|d| {
            points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p[d]), hi.max(p[d]))
            })
        })
        .collect::<Vec<_>>();

    points
        .iter()
        .map(|p| {
            p.iter()
                .zip(&bounds)
                .map(|(&v, &(lo, hi))| {
                    let span = hi - lo;
                    if span > 0.0 { (v - lo) / span } else { 0.5 }
                })
                .collect()
        })
        .collect()
}

/// Raw per-column `max - min`.
pub fn extent(points: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = points.first() else {
        return vec![];
    };
    (0..first.len())
        .map(|d| {
            let (lo, hi) = points
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p[d]), hi.max(p[d]))
                });
            hi - lo
        })
        .collect()
}

/// Exact hypervolume of maximization points above `reference`, by slicing
/// along the last objective and recursing on the rest.
pub fn hypervolume(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    let dims = reference.len();
    let mut kept = points
        .iter()
        .filter(|p| p.iter().zip(reference).all(|(v, r)| v > r))
        .cloned()
        .collect::<Vec<_>>();
    if kept.is_empty() || dims == 0 {
        return 0.0;
    }
    if dims == 1 {
        let best = kept.iter().fold(f64::NEG_INFINITY, |acc, p| acc.max(p[0]));
        return best - reference[0];
    }

    let last = dims - 1;
    kept.sort_by(|a, b| b[last].total_cmp(&a[last]));

    let mut volume = 0.0;
    for i in 0..kept.len() {
        let floor = kept.get(i + 1).map_or(reference[last], |p| p[last]);
        let depth = kept[i][last] - floor;
        if depth <= 0.0 {
            continue;
        }
        let slice = kept[..=i]
            .iter()
            .map(|p| p[..last].to_vec())
            .collect::<Vec<_>>();
        let slice = non_dominated_indices(&slice)
            .into_iter()
            .map(|idx| slice[idx].clone())
            .collect::<Vec<_>>();
        volume += depth * hypervolume(&slice, &reference[..last]);
    }
    volume
}

#[derive(Clone, Copy, Debug)]
struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Seeded Monte Carlo hypervolume estimate. Samples are drawn uniformly from
/// the box between `reference` and the per-objective maximum of `points`;
/// cost is `O(samples * points * objectives)`.
pub fn hypervolume_monte_carlo(
    points: &[Vec<f64>],
    reference: &[f64],
    samples: usize,
    seed: u64,
) -> f64 {
    let dims = reference.len();
    let kept = points
        .iter()
        .filter(|p| p.iter().zip(reference).all(|(v, r)| v > r))
        .collect::<Vec<_>>();
    if kept.is_empty() || dims == 0 || samples == 0 {
        return 0.0;
    }

    let upper = (0..dims)
        .map(|d| kept.iter().fold(f64::NEG_INFINITY, |acc, p| acc.max(p[d])))
        .collect::<Vec<_>>();
    let box_volume = upper
        .iter()
        .zip(reference)
        .map(|(u, r)| u - r)
        .product::<f64>();

    let mut rng = SplitMix64(seed);
    let mut sample = vec![0.0; dims];
    let mut hits = 0usize;
    for _ in 0..samples {
        for (d, s) in sample.iter_mut().enumerate() {
            *s = reference[d] + rng.next_f64() * (upper[d] - reference[d]);
        }
        if kept
            .iter()
            .any(|p| p.iter().zip(&sample).all(|(v, s)| v >= s))
        {
            hits += 1;
        }
    }
    box_volume * hits as f64 / samples as f64
}

/// Schott spacing: standard deviation of each member's Manhattan distance
/// to its nearest neighbour.
pub fn spacing(points: &[Vec<f64>]) -> Option<f64> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nearest = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    points[i]
                        .iter()
                        .zip(&points[j])
                        .map(|(a, b)| (a - b).abs())
                        .sum::<f64>()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .collect::<Vec<_>>();
    let mean = nearest.iter().sum::<f64>() / n as f64;
    let ss = nearest.iter().map(|d| (d - mean).powi(2)).sum::<f64>();
    Some((ss / (n - 1) as f64).sqrt())
}
