//! Rules - durable identities of analysis rule definitions

use crate::Result;
use crate::issue::{RuleKey, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A rule definition known to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub repository_key: String,
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Default severity of issues raised by this rule
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl Rule {
    pub fn new(id: i64, repository_key: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id,
            repository_key: repository_key.into(),
            key: key.into(),
            name: None,
            severity: None,
        }
    }

    pub fn rule_key(&self) -> RuleKey {
        RuleKey::new(self.repository_key.clone(), self.key.clone())
    }
}

/// Finds rules by repository key and rule key.
///
/// `Ok(None)` means no such rule; `Err` is a failure of the lookup itself.
pub trait RuleLookup {
    fn find_by_key(&self, repository_key: &str, rule_key: &str) -> Result<Option<Rule>>;
}

/// In-memory rule index
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<RuleKey, Rule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Rule) {
        self.rules.insert(rule.rule_key(), rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleRegistry {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut registry = Self::new();
        for rule in iter {
            registry.register(rule);
        }
        registry
    }
}

impl RuleLookup for RuleRegistry {
    fn find_by_key(&self, repository_key: &str, rule_key: &str) -> Result<Option<Rule>> {
        Ok(self.rules.get(&RuleKey::new(repository_key, rule_key)).cloned())
    }
}
