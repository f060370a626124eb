//! Model parameter sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named numeric parameters for an analytics model (site constants etc).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelParams(BTreeMap<String, f64>);

impl ModelParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Value for `key`, or `default` if it is not set.
    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).unwrap_or(default)
    }

    /// Overlays `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: &ModelParams) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), *v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ModelParams {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides() {
        let mut base = ModelParams::new().with("K", 1140.0).with("B", 1.6);
        base.merge(&ModelParams::new().with("K", 1000.0));
        assert_eq!(base.get("K"), Some(1000.0));
        assert_eq!(base.get("B"), Some(1.6));
        assert_eq!(base.get_or("missing", 7.0), 7.0);
    }

    #[test]
    fn test_json_is_a_plain_map() {
        let params: ModelParams = serde_json::from_str(r#"{"K": 900, "B": 1.5}"#).unwrap();
        assert_eq!(params, [("B", 1.5), ("K", 900.0)].into_iter().collect());
    }
}
