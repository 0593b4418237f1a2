// src/operation/parameters.rs

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Named parameters attached to an operation.
///
/// Values are `toml::Value`s so parameter sets can be written in config files
/// and compared structurally. Operations hand out owned copies; there is no
/// way to reach an operation's own map through a `Parameters` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, toml::Value>);

impl Parameters {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<toml::Value>,
    ) -> Option<toml::Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<toml::Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(toml::Value::as_str)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(toml::Value::as_integer)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(toml::Value::as_float)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(toml::Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, toml::Value> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, toml::Value> {
        self.0
    }
}

impl From<BTreeMap<String, toml::Value>> for Parameters {
    fn from(map: BTreeMap<String, toml::Value>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<toml::Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a String, &'a toml::Value);
    type IntoIter = btree_map::Iter<'a, String, toml::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Parameters {
    type Item = (String, toml::Value);
    type IntoIter = btree_map::IntoIter<String, toml::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_match_stored_values() {
        let params = Parameters::new()
            .with("name", "build")
            .with("retries", 3)
            .with("ratio", 0.5)
            .with("dry_run", true);

        assert_eq!(params.get_str("name"), Some("build"));
        assert_eq!(params.get_integer("retries"), Some(3));
        assert_eq!(params.get_float("ratio"), Some(0.5));
        assert_eq!(params.get_bool("dry_run"), Some(true));
        assert_eq!(params.get_str("retries"), None);
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["dry_run", "name", "ratio", "retries"]);
    }

    #[test]
    fn deserializes_from_toml_table() {
        let params: Parameters = toml::from_str("target = \"docs\"\njobs = 4\n").unwrap();
        assert_eq!(params.get_str("target"), Some("docs"));
        assert_eq!(params.get_integer("jobs"), Some(4));
    }
}
