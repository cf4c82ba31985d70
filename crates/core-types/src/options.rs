use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Which representations of a single feature go into the feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSelection {
    /// Include the raw input column.
    pub use_raw: bool,
    /// Include the derived ratio column of the same name, when one exists.
    pub use_ratio: bool,
}

impl FeatureSelection {
    pub fn new(use_raw: bool, use_ratio: bool) -> Self {
        Self { use_raw, use_ratio }
    }

    /// Neither representation selected.
    pub fn none() -> Self {
        Self::new(false, false)
    }
}

impl Default for FeatureSelection {
    /// A newly introduced feature starts with both representations selected.
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Per-feature selection flags, kept in insertion order.
///
/// The order is part of the contract: it fixes the column order of the
/// feature matrix, and a fitted model is sensitive to column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureOptions {
    entries: Vec<(String, FeatureSelection)>,
}

impl FeatureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options where every named feature is introduced with the default selection.
    pub fn with_defaults<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::new();
        for name in names {
            options.introduce(name);
        }
        options
    }

    /// Adds a feature with the default selection. An existing entry is left untouched.
    pub fn introduce(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.get(&name).is_none() {
            self.entries.push((name, FeatureSelection::default()));
        }
    }

    /// Sets the selection for a feature. Replacing an existing entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, selection: FeatureSelection) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = selection,
            None => self.entries.push((name, selection)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureSelection> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn set_use_raw(&mut self, name: &str, use_raw: bool) -> Result<(), CoreError> {
        self.get_mut(name)?.use_raw = use_raw;
        Ok(())
    }

    pub fn set_use_ratio(&mut self, name: &str, use_ratio: bool) -> Result<(), CoreError> {
        self.get_mut(name)?.use_ratio = use_ratio;
        Ok(())
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut FeatureSelection, CoreError> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
            .ok_or_else(|| CoreError::UnknownFeature(name.to_string()))
    }

    /// Iterates `(feature_name, selection)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureSelection)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FeatureSelection)> for FeatureOptions {
    fn from_iter<I: IntoIterator<Item = (S, FeatureSelection)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (name, selection) in iter {
            options.insert(name, selection);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_preserved() {
        let options = FeatureOptions::with_defaults(["Volume", "Close", "Open"]);
        let names: Vec<_> = options.names().collect();
        assert_eq!(names, vec!["Volume", "Close", "Open"]);
    }

    #[test]
    fn test_introduce_defaults_to_both() {
        let mut options = FeatureOptions::new();
        options.introduce("Close");
        assert_eq!(options.get("Close"), Some(&FeatureSelection::new(true, true)));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut options = FeatureOptions::with_defaults(["a", "b", "c"]);
        options.insert("a", FeatureSelection::none());
        let entries: Vec<_> = options.iter().map(|(n, s)| (n.to_string(), *s)).collect();
        assert_eq!(entries[0], ("a".to_string(), FeatureSelection::none()));
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn test_set_flags_on_unknown_feature_fails() {
        let mut options = FeatureOptions::with_defaults(["Close"]);
        assert_eq!(
            options.set_use_raw("High", false),
            Err(CoreError::UnknownFeature("High".to_string()))
        );
        options.set_use_ratio("Close", false).unwrap();
        assert_eq!(options.get("Close"), Some(&FeatureSelection::new(true, false)));
    }

    #[test]
    fn test_selection_deserializes_from_json() {
        let selection: FeatureSelection =
            serde_json::from_str(r#"{"use_raw": false, "use_ratio": true}"#).unwrap();
        assert_eq!(selection, FeatureSelection::new(false, true));
    }
}
