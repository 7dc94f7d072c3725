//! Filter action records.
//!
//! A [`FilterAction`] describes one applied edit operation: an identifier,
//! a version, a reproducibility category, and a parameter map. The history
//! engine stores and compares these records; it never executes them — the
//! filter pipeline that produced them is an external collaborator.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// How faithfully an action can be replayed from its parameters alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    /// Replaying with the same parameters yields identical pixels.
    Reproducible,
    /// Replaying approximates the result (external state, randomness, …).
    Complex,
    /// Only the fact that an edit happened is recorded; no replay possible.
    DocumentedHistory,
}

impl FilterCategory {
    /// `true` for the categories that cannot be replayed exactly.
    #[must_use]
    pub const fn is_lossy_to_replay(self) -> bool {
        matches!(self, Self::Complex | Self::DocumentedHistory)
    }
}

/// One applied edit operation, treated as opaque data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAction {
    /// Stable identifier of the filter, e.g. `"raw:develop"` or `"bcg:adjust"`.
    pub identifier: String,
    /// Version of the filter implementation that produced this record.
    pub version: u32,
    /// Reproducibility category.
    pub category: FilterCategory,
    /// Filter parameters, keyed by name. Ordered for stable serialization.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl FilterAction {
    /// Construct an action with an empty parameter map.
    #[must_use]
    pub fn new(identifier: impl Into<String>, version: u32, category: FilterCategory) -> Self {
        Self {
            identifier: identifier.into(),
            version,
            category,
            parameters: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterRegistry
// ---------------------------------------------------------------------------

/// Lookup for properties of filter identifiers that the pipeline knows but
/// the records themselves do not carry.
///
/// Passed explicitly into the version policy; there is no process-wide
/// instance. The default registry knows the built-in raw development steps.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    raw_conversion: HashSet<String>,
}

impl FilterRegistry {
    /// Registry with an empty identifier set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            raw_conversion: HashSet::new(),
        }
    }

    /// Register `identifier` as a raw-conversion step.
    pub fn register_raw_conversion(&mut self, identifier: impl Into<String>) {
        self.raw_conversion.insert(identifier.into());
    }

    /// `true` if `identifier` names a raw-conversion step.
    #[must_use]
    pub fn is_raw_conversion(&self, identifier: &str) -> bool {
        self.raw_conversion.contains(identifier)
    }
}

impl Default for FilterRegistry {
    /// The built-in raw development identifiers.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_raw_conversion("raw:develop");
        registry.register_raw_conversion("raw:demosaic");
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossy_to_replay_covers_complex_and_documented() {
        assert!(!FilterCategory::Reproducible.is_lossy_to_replay());
        assert!(FilterCategory::Complex.is_lossy_to_replay());
        assert!(FilterCategory::DocumentedHistory.is_lossy_to_replay());
    }

    #[test]
    fn default_registry_knows_raw_development() {
        let registry = FilterRegistry::default();
        assert!(registry.is_raw_conversion("raw:develop"));
        assert!(registry.is_raw_conversion("raw:demosaic"));
        assert!(!registry.is_raw_conversion("bcg:adjust"));
    }

    #[test]
    fn empty_registry_knows_nothing() {
        assert!(!FilterRegistry::empty().is_raw_conversion("raw:develop"));
    }

    #[test]
    fn action_serde_round_trip_with_parameters() {
        let mut action = FilterAction::new("curves:adjust", 2, FilterCategory::Reproducible);
        action
            .parameters
            .insert("channel".into(), serde_json::json!("luma"));
        let json = serde_json::to_string(&action).expect("serialize");
        let back: FilterAction = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, action);
    }

    #[test]
    fn parameters_default_to_empty_on_deserialize() {
        let json = r#"{"identifier":"bcg:adjust","version":1,"category":"reproducible"}"#;
        let action: FilterAction = serde_json::from_str(json).expect("deserialize");
        assert!(action.parameters.is_empty());
    }
}
