// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Dominance over oriented objective vectors (higher is better everywhere).

/// `a` is at least as good as `b` everywhere and strictly better somewhere.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return false;
        }
        if x > y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Indices of points no other point dominates, ascending. Identical points are all kept.
pub fn non_dominated_indices(points: &[Vec<f64>]) -> Vec<usize> {
    (0..points.len())
        .filter(|&i| {
            !points
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && dominates(other, &points[i]))
        })
        .collect()
}

/// Non-dominated sorting ranks, 1 for the front, 2 for the front once it is removed, and so on.
pub fn non_dominated_ranks(points: &[Vec<f64>]) -> Vec<usize> {
    let n = points.len();
    let mut dominated_by = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && dominates(&points[i], &points[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            }
        }
    }

    let mut ranks = vec![0usize; n];
    let mut current = (0..n)
        .filter(|&i| domination_count[i] == 0)
        .collect::<Vec<_>>();
    let mut rank = 1;
    while !current.is_empty() {
        let mut next = Vec::new();
        for &p in &current {
            ranks[p] = rank;
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        next.sort_unstable();
        current = next;
        rank += 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::{dominates, non_dominated_indices, non_dominated_ranks};

    fn points(raw: &[(f64, f64)]) -> Vec<Vec<f64>> {
        raw.iter().map(|&(a, b)| vec![a, b]).collect()
    }

    #[test]
    fn dominance_is_strict() {
        assert!(dominates(&[2.0, 2.0], &[1.0, 2.0]));
        assert!(!dominates(&[2.0, 2.0], &[2.0, 2.0]));
        assert!(!dominates(&[3.0, 1.0], &[1.0, 3.0]));
    }

    #[test]
    fn anti_chain_is_entirely_non_dominated() {
        let front = non_dominated_indices(&points(&[(1.0, 5.0), (2.0, 4.0), (3.0, 3.0), (4.0, 1.0)]));
        assert_eq!(front, vec![0, 1, 2, 3]);
    }

    #[test]
    fn single_dominating_point() {
        let front = non_dominated_indices(&points(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (1.0, 3.0)]));
        assert_eq!(front, vec![2]);
    }

    #[test]
    fn ties_are_retained() {
        let front = non_dominated_indices(&points(&[(2.0, 2.0), (1.0, 1.0), (2.0, 2.0)]));
        assert_eq!(front, vec![0, 2]);
    }

    #[test]
    fn ranks_peel_successive_fronts() {
        let ranks = non_dominated_ranks(&points(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (1.0, 3.0)]));
        assert_eq!(ranks, vec![3, 2, 1, 2]);
        assert!(non_dominated_ranks(&[]).is_empty());
    }
}
