//! Issue cache - issues accumulated in memory during a scan

use crate::issue::Issue;
use std::collections::HashMap;

/// All issues accumulated for the current run.
///
/// Read-only while issues are being persisted.
pub trait IssueCache {
    fn issues(&self) -> Box<dyn Iterator<Item = &Issue> + '_>;
}

/// Insertion-ordered cache keyed by issue key
#[derive(Debug, Clone, Default)]
pub struct InMemoryIssueCache {
    issues: Vec<Issue>,
    index: HashMap<String, usize>,
}

impl InMemoryIssueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue. An issue with the same key is replaced in place.
    pub fn put(&mut self, issue: Issue) {
        match self.index.get(&issue.key) {
            Some(&pos) => self.issues[pos] = issue,
            None => {
                self.index.insert(issue.key.clone(), self.issues.len());
                self.issues.push(issue);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Issue> {
        self.index.get(key).map(|&pos| &self.issues[pos])
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn clear(&mut self) {
        self.issues.clear();
        self.index.clear();
    }
}

impl FromIterator<Issue> for InMemoryIssueCache {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        let mut cache = Self::new();
        for issue in iter {
            cache.put(issue);
        }
        cache
    }
}

impl IssueCache for InMemoryIssueCache {
    fn issues(&self) -> Box<dyn Iterator<Item = &Issue> + '_> {
        Box::new(self.issues.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::RuleKey;

    fn sample_issue(key: &str) -> Issue {
        Issue::new(key, "comp-A", RuleKey::new("squid", "S100"))
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let cache: InMemoryIssueCache = ["B", "A", "C"].into_iter().map(sample_issue).collect();
        let keys: Vec<&str> = cache.issues().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_put_replaces_same_key() {
        let mut cache = InMemoryIssueCache::new();
        cache.put(sample_issue("A"));
        cache.put(sample_issue("B"));
        cache.put(sample_issue("A").with_line(12));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("A").unwrap().line, Some(12));
        assert_eq!(cache.issues().next().unwrap().key, "A");
    }

    #[test]
    fn test_clear() {
        let mut cache: InMemoryIssueCache = ["A"].into_iter().map(sample_issue).collect();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("A").is_none());
    }
}
