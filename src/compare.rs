use crate::holdings::{Holding, HoldingsTable};
use std::collections::HashMap;
use std::fmt;

/// Relative change between two quarters. `Undefined` when the prior
/// quarter's amount is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    Ratio(f64),
    Undefined,
}

impl Delta {
    /// `(current - prior) / prior`
    pub fn between(current: u64, prior: u64) -> Self {
        if prior == 0 {
            return Delta::Undefined;
        }
        Delta::Ratio((current as f64 - prior as f64) / prior as f64)
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            Delta::Ratio(r) => Some(*r),
            Delta::Undefined => None,
        }
    }
}

/// Which side a single-quarter position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Bought,
    Sold,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Bought => "bought",
            ChangeType::Sold => "sold",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position held in both quarters. `_q1` is the current quarter, `_q2` the
/// prior one.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub issuer_name: String,
    pub identifier: String,
    pub discretion_code: String,
    pub shares_q1: u64,
    pub shares_q2: u64,
    pub shares_difference_pct: Delta,
    pub value_q1: u64,
    pub value_q2: u64,
    pub value_difference_pct: Delta,
    pub holding_percentage_q2: f64,
    pub holding_percentage_q1: f64,
}

/// A position present in only one quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusiveRow {
    pub holding: Holding,
    pub change: ChangeType,
}

/// Rows of `source` whose composite key is missing from `other`, in
/// `source` order, tagged with `label`.
pub fn find_exclusive(
    source: &HoldingsTable,
    other: &HoldingsTable,
    label: ChangeType,
) -> Vec<ExclusiveRow> {
    let other_keys = other.keys();
    source
        .rows()
        .iter()
        .filter(|h| !other_keys.contains(&h.key()))
        .map(|h| ExclusiveRow {
            holding: h.clone(),
            change: label,
        })
        .collect()
}

/// Inner join of both quarters on the composite key, in `current` order.
pub fn merge_quarters(current: &HoldingsTable, prior: &HoldingsTable) -> Vec<ComparisonRow> {
    let prior_by_key: HashMap<_, _> = prior.rows().iter().map(|h| (h.key(), h)).collect();

    current
        .rows()
        .iter()
        .filter_map(|q1| {
            let q2 = prior_by_key.get(&q1.key())?;
            Some(ComparisonRow {
                issuer_name: q1.issuer_name.clone(),
                identifier: q1.identifier.clone(),
                discretion_code: q1.discretion_code.clone(),
                shares_q1: q1.shares,
                shares_q2: q2.shares,
                shares_difference_pct: Delta::between(q1.shares, q2.shares),
                value_q1: q1.value,
                value_q2: q2.value,
                value_difference_pct: Delta::between(q1.value, q2.value),
                holding_percentage_q2: q2.holding_percentage,
                holding_percentage_q1: q1.holding_percentage,
            })
        })
        .collect()
}

/// The three views of one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterReport {
    pub by_quarters: Vec<ComparisonRow>,
    pub bought: Vec<ExclusiveRow>,
    pub sold: Vec<ExclusiveRow>,
}

impl QuarterReport {
    pub fn build(current: &HoldingsTable, prior: &HoldingsTable) -> Self {
        QuarterReport {
            by_quarters: merge_quarters(current, prior),
            bought: find_exclusive(current, prior, ChangeType::Bought),
            sold: find_exclusive(prior, current, ChangeType::Sold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(rows: &[(&str, &str, u64, u64)]) -> HoldingsTable {
        let rows = rows
            .iter()
            .map(|(id, disc, shares, value)| Holding::new(format!("{id} INC"), *id, *disc, *value, *shares))
            .collect();
        HoldingsTable::from_holdings(rows).unwrap()
    }

    #[test]
    fn exclusive_row_from_empty_other() {
        let a = table(&[("X", "1", 10, 100)]);
        let b = table(&[]);
        let rows = find_exclusive(&a, &b, ChangeType::Bought);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].change, ChangeType::Bought);
        assert_eq!(rows[0].change.to_string(), "bought");
        assert_eq!(rows[0].holding.shares, 10);
    }

    #[test]
    fn exclusive_preserves_source_order() {
        let a = table(&[("C", "SOLE", 1, 1), ("A", "SOLE", 1, 1), ("B", "SOLE", 1, 1), ("D", "SOLE", 1, 1)]);
        let b = table(&[("A", "SOLE", 1, 1)]);
        let ids: Vec<_> = find_exclusive(&a, &b, ChangeType::Sold)
            .into_iter()
            .map(|r| r.holding.identifier)
            .collect();
        assert_eq!(ids, vec!["C", "B", "D"]);
    }

    #[test]
    fn exclusive_is_empty_when_all_keys_shared() {
        let a = table(&[("A", "SOLE", 1, 1), ("B", "DFND", 2, 2)]);
        let b = table(&[("B", "DFND", 9, 9), ("A", "SOLE", 5, 5)]);
        assert!(find_exclusive(&a, &b, ChangeType::Bought).is_empty());
    }

    #[test]
    fn discretion_code_is_part_of_the_key() {
        let a = table(&[("A", "SOLE", 1, 1)]);
        let b = table(&[("A", "DFND", 1, 1)]);
        assert_eq!(find_exclusive(&a, &b, ChangeType::Bought).len(), 1);
        assert!(merge_quarters(&a, &b).is_empty());
    }

    #[test]
    fn key_parts_do_not_bleed_into_each_other() {
        // "AB"+"C" and "A"+"BC" concatenate to the same string
        let a = table(&[("AB", "C", 1, 1)]);
        let b = table(&[("A", "BC", 1, 1)]);
        assert_eq!(find_exclusive(&a, &b, ChangeType::Bought).len(), 1);
    }

    #[test]
    fn merge_computes_differences() {
        let a = table(&[("X", "1", 10, 100)]);
        let b = table(&[("X", "1", 5, 50)]);
        let rows = merge_quarters(&a, &b);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.shares_q1, 10);
        assert_eq!(row.shares_q2, 5);
        assert_eq!(row.shares_difference_pct, Delta::Ratio(1.0));
        assert_eq!(row.value_q1, 100);
        assert_eq!(row.value_q2, 50);
        assert_eq!(row.value_difference_pct, Delta::Ratio(1.0));
        assert_eq!(row.holding_percentage_q1, 1.0);
        assert_eq!(row.holding_percentage_q2, 1.0);
    }

    #[test]
    fn merge_reports_decrease_as_negative() {
        let a = table(&[("X", "SOLE", 25, 30)]);
        let b = table(&[("X", "SOLE", 100, 40)]);
        let row = &merge_quarters(&a, &b)[0];
        assert_eq!(row.shares_difference_pct.ratio(), Some(-0.75));
        assert_eq!(row.value_difference_pct.ratio(), Some(-0.25));
    }

    #[test]
    fn merge_with_zero_prior_is_undefined() {
        let a = table(&[("X", "SOLE", 10, 100), ("Y", "SOLE", 1, 1)]);
        let b = table(&[("X", "SOLE", 0, 0), ("Y", "SOLE", 1, 1)]);
        let row = &merge_quarters(&a, &b)[0];
        assert_eq!(row.shares_difference_pct, Delta::Undefined);
        assert_eq!(row.value_difference_pct, Delta::Undefined);
        assert_eq!(row.value_difference_pct.ratio(), None);
    }

    #[test]
    fn merge_of_disjoint_tables_is_empty() {
        let a = table(&[("A", "SOLE", 1, 1), ("B", "SOLE", 1, 1)]);
        let b = table(&[("C", "SOLE", 1, 1)]);
        assert!(merge_quarters(&a, &b).is_empty());
    }

    #[test]
    fn merge_follows_current_order_and_issuer() {
        let a = table(&[("B", "SOLE", 1, 1), ("A", "SOLE", 1, 1)]);
        let prior = HoldingsTable::from_holdings(vec![
            Holding::new("OLD NAME", "A", "SOLE", 1, 1),
            Holding::new("OLD NAME", "B", "SOLE", 1, 1),
        ])
        .unwrap();
        let rows = merge_quarters(&a, &prior);
        let ids: Vec<_> = rows.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(rows[0].issuer_name, "B INC");
    }

    #[test]
    fn keys_partition_across_the_three_views() {
        let current = table(&[
            ("A", "SOLE", 1, 10),
            ("B", "SOLE", 2, 20),
            ("B", "DFND", 3, 30),
            ("D", "OTR", 4, 40),
        ]);
        let prior = table(&[
            ("B", "SOLE", 5, 50),
            ("C", "SOLE", 6, 60),
            ("D", "OTR", 7, 70),
            ("E", "DFND", 8, 80),
        ]);
        let report = QuarterReport::build(&current, &prior);

        let merged: HashSet<_> = report
            .by_quarters
            .iter()
            .map(|r| (r.identifier.clone(), r.discretion_code.clone()))
            .collect();
        let bought: HashSet<_> = report
            .bought
            .iter()
            .map(|r| (r.holding.identifier.clone(), r.holding.discretion_code.clone()))
            .collect();
        let sold: HashSet<_> = report
            .sold
            .iter()
            .map(|r| (r.holding.identifier.clone(), r.holding.discretion_code.clone()))
            .collect();

        assert!(merged.is_disjoint(&bought));
        assert!(merged.is_disjoint(&sold));
        assert!(bought.is_disjoint(&sold));

        let all: HashSet<_> = current
            .rows()
            .iter()
            .chain(prior.rows())
            .map(|h| (h.identifier.clone(), h.discretion_code.clone()))
            .collect();
        let union: HashSet<_> = merged.union(&bought).cloned().collect::<HashSet<_>>()
            .union(&sold)
            .cloned()
            .collect();
        assert_eq!(union, all);

        assert_eq!(merged.len(), 2);
        assert_eq!(bought.len(), 2);
        assert_eq!(sold.len(), 2);
        assert!(report.sold.iter().all(|r| r.change == ChangeType::Sold));
        assert!(report.bought.iter().all(|r| r.change == ChangeType::Bought));
    }
}
