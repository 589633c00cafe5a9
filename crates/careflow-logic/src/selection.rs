//! Budgeted top-K selection.
//!
//! Picks the `budget` highest-scoring patients. Equal scores are broken by
//! ascending patient index so a fixed seed always yields the same set.
//! The returned indices are sorted ascending.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSelector {
    budget: usize,
}

impl BudgetSelector {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Indices of the `min(budget, scores.len())` highest scores.
    pub fn select(&self, scores: &[f64]) -> Vec<usize> {
        let k = self.budget.min(scores.len());
        if k == 0 {
            return Vec::new();
        }
        if k == scores.len() {
            return (0..k).collect();
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.select_nth_unstable_by(k - 1, |&a, &b| priority_order(scores, a, b));
        order.truncate(k);
        order.sort_unstable();
        order
    }
}

/// Higher score first, then lower index. Total, so NaN never panics.
fn priority_order(scores: &[f64], a: usize, b: usize) -> Ordering {
    scores[b].total_cmp(&scores[a]).then(a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_picks_highest() {
        let selector = BudgetSelector::new(2);
        assert_eq!(selector.select(&[0.1, 0.8, 0.3, 0.9]), vec![1, 3]);
    }

    #[test]
    fn test_tie_break_ascending_index() {
        let selector = BudgetSelector::new(2);
        assert_eq!(selector.select(&[0.9, 0.1, 0.5, 0.9, 0.3]), vec![0, 3]);

        // Three-way tie for two slots keeps the lowest indices.
        let selector = BudgetSelector::new(2);
        assert_eq!(selector.select(&[0.4, 0.7, 0.7, 0.7]), vec![1, 2]);
    }

    #[test]
    fn test_zero_budget() {
        assert!(BudgetSelector::new(0).select(&[0.5, 0.6]).is_empty());
    }

    #[test]
    fn test_budget_covers_everyone() {
        assert_eq!(BudgetSelector::new(3).select(&[0.5, 0.1, 0.9]), vec![0, 1, 2]);
        assert_eq!(BudgetSelector::new(10).select(&[0.5, 0.1]), vec![0, 1]);
    }

    #[test]
    fn test_nan_does_not_panic() {
        let picked = BudgetSelector::new(1).select(&[0.2, f64::NAN, 0.3]);
        assert_eq!(picked.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_selection_is_top_k(
            scores in proptest::collection::vec(0.0f64..1.0, 1..64),
            budget in 0usize..80,
        ) {
            let picked = BudgetSelector::new(budget).select(&scores);
            let k = budget.min(scores.len());

            prop_assert_eq!(picked.len(), k);
            prop_assert!(picked.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(picked.iter().all(|&i| i < scores.len()));

            // Every picked patient outranks every unpicked one.
            for &p in &picked {
                for u in (0..scores.len()).filter(|u| !picked.contains(u)) {
                    prop_assert_eq!(priority_order(&scores, p, u), Ordering::Less);
                }
            }
        }
    }
}
