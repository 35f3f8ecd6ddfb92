//! Trailing-window aggregation per entity
//!
//! Every value produced here is computed from strictly earlier dates of the
//! same entity. Rows sharing a date never see each other, and an entity with
//! fewer than `window` prior observations gets no value at all rather than a
//! partial-window average.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::{MlbError, Result};

/// How a full window of observations collapses into one vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Sum,
}

/// One entity's numeric metrics on one date
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<K> {
    pub entity: K,
    pub date: NaiveDate,
    /// Metric values in a fixed, caller-defined order; `None` when missing
    pub values: Vec<Option<f64>>,
}

impl<K> Observation<K> {
    pub fn new(entity: K, date: NaiveDate, values: Vec<Option<f64>>) -> Self {
        Observation {
            entity,
            date,
            values,
        }
    }
}

/// The last `size` observations of a single entity
#[derive(Debug, Clone)]
pub struct RollingWindow {
    size: usize,
    recent: VecDeque<Vec<Option<f64>>>,
}

impl RollingWindow {
    pub fn new(size: usize) -> Self {
        RollingWindow {
            size,
            recent: VecDeque::with_capacity(size + 1),
        }
    }

    /// Append an observation, evicting the oldest once the window is full
    pub fn push(&mut self, values: Vec<Option<f64>>) {
        self.recent.push_back(values);
        while self.recent.len() > self.size {
            self.recent.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.size > 0 && self.recent.len() == self.size
    }

    /// Aggregate of the window, or `None` if it is not full or any value is missing
    pub fn aggregate(&self, aggregation: Aggregation) -> Option<Vec<f64>> {
        if !self.is_full() {
            return None;
        }
        let width = self.recent.front()?.len();
        let mut totals = vec![0.0; width];
        for values in &self.recent {
            if values.len() != width {
                return None;
            }
            for (total, value) in totals.iter_mut().zip(values) {
                *total += (*value)?;
            }
        }
        if aggregation == Aggregation::Mean {
            let n = self.recent.len() as f64;
            totals.iter_mut().for_each(|t| *t /= n);
        }
        Some(totals)
    }
}

/// Computes trailing-window aggregates for many entities at once
#[derive(Debug, Clone, Copy)]
pub struct RollingAggregator {
    window: usize,
    aggregation: Aggregation,
}

impl RollingAggregator {
    pub fn new(window: usize, aggregation: Aggregation) -> Result<Self> {
        if window == 0 {
            return Err(MlbError::Config("rolling window must be at least 1".into()));
        }
        Ok(RollingAggregator {
            window,
            aggregation,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Row indices per entity, each list in date order (ties keep input order)
    fn group_by_entity<'a, K: Ord>(rows: &'a [Observation<K>]) -> BTreeMap<&'a K, Vec<usize>> {
        let mut groups: BTreeMap<&K, Vec<usize>> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            groups.entry(&row.entity).or_default().push(i);
        }
        for indices in groups.values_mut() {
            indices.sort_by_key(|&i| rows[i].date);
        }
        groups
    }

    /// Aggregate over each row's prior observations, aligned with `rows`.
    ///
    /// Order across entities and dates does not matter; rows of one entity
    /// sharing a date enter the window in input order. A row's value depends
    /// only on rows of the same entity with an earlier date.
    pub fn compute<K: Ord>(&self, rows: &[Observation<K>]) -> Vec<Option<Vec<f64>>> {
        let mut out = vec![None; rows.len()];

        for indices in Self::group_by_entity(rows).into_values() {
            let mut window = RollingWindow::new(self.window);
            let mut start = 0;
            while start < indices.len() {
                let date = rows[indices[start]].date;
                let end = start
                    + indices[start..]
                        .iter()
                        .take_while(|&&i| rows[i].date == date)
                        .count();
                let block = &indices[start..end];

                // Read before write: same-date rows share the pre-date window
                let value = window.aggregate(self.aggregation);
                for &i in block {
                    out[i] = value.clone();
                }
                for &i in block {
                    window.push(rows[i].values.clone());
                }
                start = end;
            }
        }

        out
    }

    /// Aggregate over the last `window` observations dated before `cutoff`,
    /// for every entity that has enough of them.
    pub fn latest_before<K: Ord + Clone>(
        &self,
        rows: &[Observation<K>],
        cutoff: NaiveDate,
    ) -> BTreeMap<K, Vec<f64>> {
        let mut latest = BTreeMap::new();
        for (entity, indices) in Self::group_by_entity(rows) {
            let mut window = RollingWindow::new(self.window);
            for &i in indices.iter().filter(|&&i| rows[i].date < cutoff) {
                window.push(rows[i].values.clone());
            }
            if let Some(values) = window.aggregate(self.aggregation) {
                latest.insert(entity.clone(), values);
            }
        }
        latest
    }

    /// `compute` keyed by `(entity, date)` for joins. Rows sharing a key
    /// always share a value, so duplicates collapse without ambiguity.
    pub fn index<K: Ord + Clone + std::hash::Hash>(
        &self,
        rows: &[Observation<K>],
    ) -> HashMap<(K, NaiveDate), Vec<f64>> {
        let mut index = HashMap::new();
        for (row, value) in rows.iter().zip(self.compute(rows)) {
            if let Some(value) = value {
                index
                    .entry((row.entity.clone(), row.date))
                    .or_insert(value);
            }
        }
        index
    }
}

/// Ratio with an undefined result for a zero or missing denominator
pub fn rate(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}
