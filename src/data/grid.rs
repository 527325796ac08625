// ============================================================
// Layer 4 — Hyperparameter Grid
// ============================================================
// A grid maps each hyperparameter name to an ordered list of
// candidate values. Iterating the grid yields every combination
// (the Cartesian product) as a GridPoint, in odometer order:
// the last declared parameter changes fastest.
//
//   { batch_size: [64, 128], lr: [0.1, 0.01] }
//
//     → batch_size=64,  lr=0.1
//     → batch_size=64,  lr=0.01
//     → batch_size=128, lr=0.1
//     → batch_size=128, lr=0.01
//
// Iteration is lazy and restartable: every call to iter()
// reproduces the same sequence. A parameter with no candidates
// makes the whole product empty, which is not an error.
//
// Reference: Rust Book §13 (Implementing the Iterator trait)

use std::fmt;

use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::domain::error::ConfigurationError;

/// Ordered mapping from parameter name to candidate values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid<V> {
    params: Vec<(String, Vec<V>)>,
}

impl<V> Default for ParamGrid<V> {
    fn default() -> Self {
        Self { params: Vec::new() }
    }
}

impl<V: Clone> ParamGrid<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from `(name, candidates)` pairs in declaration order.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (S, Vec<V>)>,
        S: Into<String>,
    {
        let mut grid = Self::new();
        for (name, values) in pairs {
            grid.insert(name, values)?;
        }
        Ok(grid)
    }

    /// Declare a parameter after the ones already present.
    pub fn insert(
        &mut self,
        name:   impl Into<String>,
        values: Vec<V>,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if self.params.iter().any(|(n, _)| *n == name) {
            return Err(ConfigurationError::DuplicateParameter { name });
        }
        self.params.push((name, values));
        Ok(())
    }

    /// Parameter names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    /// Number of configurations the grid yields, without iterating.
    /// A grid with no parameters yields one empty configuration.
    pub fn len(&self) -> usize {
        self.params.iter().map(|(_, v)| v.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily iterate over every configuration.
    pub fn iter(&self) -> GridIter<'_, V> {
        let exhausted = self.params.iter().any(|(_, v)| v.is_empty());
        GridIter {
            grid:      self,
            counters:  vec![0; self.params.len()],
            exhausted,
        }
    }
}

impl ParamGrid<serde_json::Value> {
    /// Build a grid from a JSON object whose values are arrays, e.g.
    /// `{"batch_size": [64, 128], "lr": [0.001]}`. Key order is kept.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigurationError> {
        let object = value.as_object().ok_or_else(|| ConfigurationError::InvalidParameter {
            name:   "<grid>".to_string(),
            reason: "grid must be a JSON object".to_string(),
        })?;

        let mut grid = Self::new();
        for (name, candidates) in object {
            let values = candidates
                .as_array()
                .ok_or_else(|| ConfigurationError::InvalidParameter {
                    name:   name.clone(),
                    reason: "candidates must be a JSON array".to_string(),
                })?;
            grid.insert(name.clone(), values.clone())?;
        }
        Ok(grid)
    }
}

impl<'g, V: Clone> IntoIterator for &'g ParamGrid<V> {
    type Item     = GridPoint<V>;
    type IntoIter = GridIter<'g, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ─── GridPoint ────────────────────────────────────────────────────────────────
/// One concrete value per parameter, in the grid's declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint<V> {
    values: Vec<(String, V)>,
}

impl<V> GridPoint<V> {
    pub fn get(&self, name: &str) -> Option<&V> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Serialised as a plain JSON object so reports read like the grid file.
impl<V: Serialize> Serialize for GridPoint<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<V: fmt::Display> fmt::Display for GridPoint<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "<defaults>");
        }
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

// ─── GridIter ─────────────────────────────────────────────────────────────────
/// Odometer over candidate indices: `counters[i]` picks the candidate
/// of parameter `i`; the last counter ticks first and carries left.
pub struct GridIter<'g, V> {
    grid:      &'g ParamGrid<V>,
    counters:  Vec<usize>,
    exhausted: bool,
}

impl<'g, V: Clone> Iterator for GridIter<'g, V> {
    type Item = GridPoint<V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let values = self
            .grid
            .params
            .iter()
            .zip(&self.counters)
            .map(|((name, candidates), &c)| (name.clone(), candidates[c].clone()))
            .collect();

        // Advance the odometer; carrying out of the first digit ends iteration.
        self.exhausted = true;
        for pos in (0..self.counters.len()).rev() {
            self.counters[pos] += 1;
            if self.counters[pos] < self.grid.params[pos].1.len() {
                self.exhausted = false;
                break;
            }
            self.counters[pos] = 0;
        }

        Some(GridPoint { values })
    }
}
