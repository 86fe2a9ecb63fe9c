use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::record::{Dimension, Metric, Metrics, Record};

/// Relative slack allowed between the grand total and the summed group subtotals.
const TOTAL_TOLERANCE: f64 = 1e-9;

/// Group identity. Blank dimension cells share the `Missing` group, which sorts last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum GroupKey {
    Value(String),
    Missing,
}

impl GroupKey {
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) => GroupKey::Value(v.to_string()),
            None => GroupKey::Missing,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GroupKey::Value(v) => Some(v),
            GroupKey::Missing => None,
        }
    }

    /// Axis label for this group.
    pub fn label(&self) -> &str {
        self.as_str().unwrap_or("(none)")
    }
}

impl From<Option<String>> for GroupKey {
    fn from(value: Option<String>) -> Self {
        value.map_or(GroupKey::Missing, GroupKey::Value)
    }
}

impl From<GroupKey> for Option<String> {
    fn from(value: GroupKey) -> Self {
        match value {
            GroupKey::Value(v) => Some(v),
            GroupKey::Missing => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub key: GroupKey,
    pub record_count: usize,
    pub sums: Metrics,
}

impl GroupTotals {
    fn empty(key: GroupKey) -> Self {
        Self {
            key,
            record_count: 0,
            sums: Metrics::default(),
        }
    }
}

/// Per-group metric sums for one dimension plus the grand total of `Sum` hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub dimension: Dimension,
    pub groups: Vec<GroupTotals>,
    pub grand_total: f64,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, key: &str) -> Option<&GroupTotals> {
        self.groups.iter().find(|g| g.key.as_str() == Some(key))
    }

    pub fn labels(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.key.label().to_string()).collect()
    }

    /// `(label, hours)` for `metric`, one entry per group in group order.
    pub fn series(&self, metric: Metric) -> Vec<(String, f64)> {
        self.groups
            .iter()
            .map(|g| (g.key.label().to_string(), g.sums.get(metric)))
            .collect()
    }

    pub fn subtotal_sum(&self) -> f64 {
        self.groups.iter().fold(0.0, |acc, g| acc + g.sums.total)
    }

    /// Grand total agrees with the per-group `Sum` subtotals.
    pub fn is_consistent(&self) -> bool {
        let subtotal = self.subtotal_sum();
        (self.grand_total - subtotal).abs() <= TOTAL_TOLERANCE * self.grand_total.abs().max(1.0)
    }
}

/// Group `records` by `dimension` and sum every metric per group.
///
/// Groups come back ordered by key (lexicographic, blank last). The grand total
/// is summed straight from the records, independent of the grouping.
pub fn aggregate(records: &[&Record], dimension: Dimension) -> AggregationResult {
    let mut buckets: BTreeMap<GroupKey, GroupTotals> = BTreeMap::new();
    for record in records {
        let key = GroupKey::from_value(dimension.value(record));
        let group = buckets
            .entry(key.clone())
            .or_insert_with(|| GroupTotals::empty(key));
        group.record_count += 1;
        group.sums.add(&record.metrics);
    }
    // Folding from +0.0 keeps an empty selection at 0, not -0.
    let grand_total = records.iter().fold(0.0, |acc, r| acc + r.metrics.total);
    let result = AggregationResult {
        dimension,
        groups: buckets.into_values().collect(),
        grand_total,
    };
    debug!(
        "aggregated {} records into {} {} groups",
        records.len(),
        result.groups.len(),
        dimension
    );
    if !result.is_consistent() {
        warn!(
            "grand total {} disagrees with group subtotal {}",
            result.grand_total,
            result.subtotal_sum()
        );
    }
    debug_assert!(result.is_consistent());
    result
}
