//! Per-field statistics accumulated over a sample of rows.
//!
//! [`StatisticsCollector::observe`] is the only mutator. Statistics grow
//! monotonically while the sample window is open and are then handed, frozen,
//! to [`crate::schema::build_schema`].
//!
//! Fields are kept in an [`IndexMap`] so that iteration (and therefore column
//! order and every tie-break downstream) follows field discovery order and is
//! reproducible across runs.

use crate::value::{Row, ValueKind};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Multiset of observed [`ValueKind`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    counts: IndexMap<ValueKind, u64>,
}

impl KindCounts {
    /// Increment the bucket for `kind`.
    pub fn add(&mut self, kind: ValueKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    /// Observations recorded for `kind` (zero if never seen).
    #[must_use]
    pub fn get(&self, kind: ValueKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Sum of every bucket.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The most frequent kind, if any.
    ///
    /// Ties are broken by [`ValueKind::RANKED`], never by the order in which
    /// kinds were first observed.
    #[must_use]
    pub fn dominant(&self) -> Option<ValueKind> {
        let mut best: Option<(ValueKind, u64)> = None;
        for kind in ValueKind::RANKED {
            let n = self.get(kind);
            if n == 0 {
                continue;
            }
            match best {
                Some((_, m)) if m >= n => {}
                _ => best = Some((kind, n)),
            }
        }
        best.map(|(k, _)| k)
    }

    /// Counts with integers merged into floats when both were observed.
    ///
    /// A field mixing `1` and `2.5` is one numeric field, stored as float64.
    #[must_use]
    pub fn numbers_unified(&self) -> KindCounts {
        let mut out = self.clone();
        if out.get(ValueKind::Float) > 0
            && let Some(n) = out.counts.shift_remove(&ValueKind::Integer)
        {
            *out.counts.entry(ValueKind::Float).or_insert(0) += n;
        }
        out
    }
}

/// Observations for one field name across the sample window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldStatistics {
    /// Rows in which the field appeared (null or not).
    pub total_count: u64,
    /// Rows in which the field was explicitly `null`.
    pub null_count: u64,
    /// Kinds of the field's own non-null values.
    pub kinds: KindCounts,
    /// Kinds of every non-null element of every array value seen for this field.
    pub element_kinds: KindCounts,
}

impl FieldStatistics {
    fn observe(&mut self, value: &Value) {
        self.total_count += 1;
        match value {
            Value::Null => self.null_count += 1,
            Value::Array(items) => {
                self.kinds.add(ValueKind::Array);
                for item in items.iter().filter(|v| !v.is_null()) {
                    self.element_kinds.add(ValueKind::of(item));
                }
            }
            other => self.kinds.add(ValueKind::of(other)),
        }
    }
}

/// Accumulates [`FieldStatistics`] for every field name seen in the observed rows.
#[derive(Clone, Debug, Default)]
pub struct StatisticsCollector {
    fields: IndexMap<String, FieldStatistics>,
    rows_observed: u64,
}

impl StatisticsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every field of `row`.
    ///
    /// Never fails; empty arrays and empty objects are ordinary observations.
    pub fn observe(&mut self, row: &Row) {
        self.rows_observed += 1;
        for (name, value) in row {
            // `get_mut` first so the key is only allocated for new fields.
            if let Some(stats) = self.fields.get_mut(name) {
                stats.observe(value);
            } else {
                let mut stats = FieldStatistics::default();
                stats.observe(value);
                self.fields.insert(name.clone(), stats);
            }
        }
    }

    /// Number of rows passed to [`observe`](Self::observe).
    #[must_use]
    pub fn rows_observed(&self) -> u64 {
        self.rows_observed
    }

    /// Statistics for one field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldStatistics> {
        self.fields.get(name)
    }

    /// `true` if `name` appeared in at least one observed row.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate fields in discovery order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldStatistics)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
