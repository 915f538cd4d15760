use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dimension::Dimension;

/// AND-combined dimension equality constraints.
///
/// The map is ordered, so the canonical signature is stable regardless of
/// the order constraints were added in. The empty filter denotes the global
/// scope and has the empty-string signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionFilter(BTreeMap<Dimension, String>);

impl DimensionFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.0.insert(dimension, value.into());
        self
    }

    pub fn insert(&mut self, dimension: Dimension, value: impl Into<String>) {
        self.0.insert(dimension, value.into());
    }

    /// Copy of this filter with any constraint on `dimension` removed. Used
    /// by grouped analytics so a group-by dimension never carries a
    /// contradictory equality from the extra filters.
    #[must_use]
    pub fn without(&self, dimension: Dimension) -> Self {
        let mut out = self.clone();
        out.0.remove(&dimension);
        out
    }

    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.0.get(&dimension).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &str)> {
        self.0.iter().map(|(d, v)| (*d, v.as_str()))
    }

    /// Canonical persistence key for this filter scope. Empty filter maps to
    /// the empty string, which is the global-scope marker in storage.
    #[must_use]
    pub fn signature(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let pairs: BTreeMap<&str, &str> = self
            .0
            .iter()
            .map(|(d, v)| (d.as_str(), v.as_str()))
            .collect();
        serde_json::to_string(&pairs).unwrap_or_default()
    }

    pub fn from_signature(signature: &str) -> Result<Self, serde_json::Error> {
        if signature.is_empty() {
            return Ok(Self::default());
        }
        let pairs: BTreeMap<Dimension, String> = serde_json::from_str(signature)?;
        Ok(Self(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_order_independent() {
        let a = DimensionFilter::new()
            .with(Dimension::Sector, "finance")
            .with(Dimension::Region, "emea");
        let b = DimensionFilter::new()
            .with(Dimension::Region, "emea")
            .with(Dimension::Sector, "finance");
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature(), r#"{"region":"emea","sector":"finance"}"#);
    }

    #[test]
    fn empty_signature_is_global_scope() {
        assert_eq!(DimensionFilter::new().signature(), "");
        let parsed = DimensionFilter::from_signature("").expect("empty signature");
        assert!(parsed.is_empty());
    }

    #[test]
    fn signature_round_trips() {
        let f = DimensionFilter::new()
            .with(Dimension::Region, "apac")
            .with(Dimension::Gender, "female");
        let parsed = DimensionFilter::from_signature(&f.signature()).expect("round trip");
        assert_eq!(parsed, f);
    }

    #[test]
    fn without_drops_only_the_named_dimension() {
        let f = DimensionFilter::new()
            .with(Dimension::Region, "emea")
            .with(Dimension::Sector, "tech");
        let g = f.without(Dimension::Region);
        assert_eq!(g.get(Dimension::Region), None);
        assert_eq!(g.get(Dimension::Sector), Some("tech"));
        assert_eq!(f.len(), 2, "original filter is untouched");
    }
}
