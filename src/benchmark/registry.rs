//! The ordered rule table.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use super::rule::Rule;
use super::rules;

/// A rule as listed in the registry, possibly under an alias id.
#[derive(Clone)]
pub struct RuleEntry {
    /// Id the rule is selected and reported under
    pub id: String,
    /// Title reported under this id
    pub title: String,
    /// The evaluator/remediation pair
    pub rule: Arc<dyn Rule>,
}

impl RuleEntry {
    /// Id of the rule that actually runs.
    pub fn canonical_id(&self) -> &str {
        self.rule.id()
    }

    pub fn is_alias(&self) -> bool {
        self.id != self.rule.id()
    }
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("id", &self.id)
            .field("canonical_id", &self.canonical_id())
            .field("title", &self.title)
            .finish()
    }
}

/// Rule ids mapped to rules, in numeric id order.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    entries: IndexMap<String, RuleEntry>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The CIS VMware ESXi 8 rule set. 5.10 shares the 5.9 evaluator.
    pub fn esxi8() -> Self {
        let mut registry = Self::new();
        for rule in rules::all_rules() {
            registry.register(rule);
        }
        registry.register_alias("5.10", "5.9", "Port-group VLAN hygiene (trunk VLANs)");
        registry.sort();
        registry
    }

    /// Add a rule under its own id, replacing any rule with the same id.
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        let id = rule.id().to_string();
        let title = rule.title().to_string();
        self.entries.insert(id.clone(), RuleEntry { id, title, rule });
    }

    /// Expose the rule registered as `target` under a second id.
    /// Returns false when `target` is unknown.
    pub fn register_alias(&mut self, alias: &str, target: &str, title: &str) -> bool {
        let Some(rule) = self.entries.get(target).map(|e| e.rule.clone()) else {
            warn!(alias = %alias, target = %target, "Alias target not registered");
            return false;
        };
        self.entries.insert(
            alias.to_string(),
            RuleEntry {
                id: alias.to_string(),
                title: title.to_string(),
                rule,
            },
        );
        true
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, _, b, _| rule_sort_key(a).cmp(&rule_sort_key(b)));
    }

    pub fn get(&self, id: &str) -> Option<&RuleEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turn operator input into rule ids.
    ///
    /// Tokens are separated by commas or whitespace. Returns the selected ids
    /// in registry order and the tokens that matched no rule. When nothing
    /// valid was given every rule is selected.
    pub fn resolve(&self, input: &str) -> (Vec<String>, Vec<String>) {
        let mut requested = Vec::new();
        let mut rejected = Vec::new();

        for token in input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if self.contains(token) {
                requested.push(token);
            } else {
                rejected.push(token.to_string());
            }
        }

        let selected = if requested.is_empty() {
            self.entries.keys().cloned().collect()
        } else {
            self.entries
                .keys()
                .filter(|id| requested.contains(&id.as_str()))
                .cloned()
                .collect()
        };

        (selected, rejected)
    }
}

/// Numeric ordering key for dotted ids, so `3.12` sorts after `3.9`.
pub fn rule_sort_key(id: &str) -> Vec<u32> {
    id.split('.')
        .map(|part| part.parse().unwrap_or(u32::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_esxi8_order() {
        let registry = RuleRegistry::esxi8();
        assert_eq!(
            registry.ids(),
            vec![
                "2.4", "2.10", "3.3", "3.7", "3.8", "3.9", "3.12", "3.13", "4.2", "5.6", "5.7",
                "5.8", "5.9", "5.10", "7.6", "7.21", "7.22", "7.24", "7.26", "7.27",
            ]
        );
        assert_eq!(registry.len(), 20);
    }

    #[test]
    fn test_alias_shares_rule() {
        let registry = RuleRegistry::esxi8();
        let alias = registry.get("5.10").unwrap();
        assert!(alias.is_alias());
        assert_eq!(alias.canonical_id(), "5.9");
        assert!(!registry.get("5.9").unwrap().is_alias());
    }

    #[test]
    fn test_alias_to_unknown_target() {
        let mut registry = RuleRegistry::new();
        assert!(!registry.register_alias("9.1", "9.0", "nothing"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve() {
        let registry = RuleRegistry::esxi8();

        let (selected, rejected) = registry.resolve("3.7, 2.4 bogus 3.7");
        assert_eq!(selected, vec!["2.4", "3.7"]);
        assert_eq!(rejected, vec!["bogus"]);

        let (selected, rejected) = registry.resolve("");
        assert_eq!(selected.len(), registry.len());
        assert!(rejected.is_empty());

        let (selected, rejected) = registry.resolve("9.9,x");
        assert_eq!(selected.len(), registry.len());
        assert_eq!(rejected, vec!["9.9", "x"]);
    }

    #[test]
    fn test_rule_sort_key() {
        assert!(rule_sort_key("3.9") < rule_sort_key("3.12"));
        assert!(rule_sort_key("5.10") > rule_sort_key("5.9"));
        assert!(rule_sort_key("7.6") < rule_sort_key("7.21"));
    }
}
