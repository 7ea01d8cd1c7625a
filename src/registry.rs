//! Check registry
//!
//! Maps check names to their definitions. Populated once from configuration
//! and read-only afterwards.

use std::collections::BTreeMap;

use crate::config::{CheckDefinition, GateConfig};

/// How a hook name resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Found(&'a CheckDefinition),
    Disabled(&'a CheckDefinition),
    Unknown,
}

impl Resolution<'_> {
    /// Why the name did not resolve, if it did not
    pub fn skip_reason(&self, name: &str) -> Option<String> {
        match self {
            Resolution::Found(_) => None,
            Resolution::Disabled(_) => Some(format!("check '{name}' is disabled")),
            Resolution::Unknown => Some(format!("check '{name}' is not defined")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    checks: BTreeMap<String, CheckDefinition>,
}

impl CheckRegistry {
    /// Build a registry; a later definition with the same name replaces an earlier one
    pub fn new(checks: impl IntoIterator<Item = CheckDefinition>) -> Self {
        let checks = checks
            .into_iter()
            .map(|check| (check.name.clone(), check))
            .collect();
        Self { checks }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.checks.iter().map(|(name, check)| CheckDefinition {
            name: name.clone(),
            ..check.clone()
        }))
    }

    /// The enabled definition for `name`, if any
    pub fn resolve(&self, name: &str) -> Option<&CheckDefinition> {
        self.checks.get(name).filter(|check| check.enabled)
    }

    /// Resolve `name`, keeping the reason when it does not resolve
    pub fn lookup(&self, name: &str) -> Resolution<'_> {
        match self.checks.get(name) {
            Some(check) if check.enabled => Resolution::Found(check),
            Some(check) => Resolution::Disabled(check),
            None => Resolution::Unknown,
        }
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
