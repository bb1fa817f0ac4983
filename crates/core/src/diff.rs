//! Leaf-level comparison of two documents, used to decide whether a rendered
//! config changed between reconcile passes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ConfigDocument;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDiff {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl DocumentDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

impl ConfigDocument {
    /// What `self` adds, changes and drops relative to `base`. Lists compare as a whole.
    pub fn diff(&self, base: &ConfigDocument) -> DocumentDiff {
        let ours: BTreeSet<String> = self.leaf_paths().into_iter().collect();
        let theirs: BTreeSet<String> = base.leaf_paths().into_iter().collect();
        let mut out = DocumentDiff::default();
        for path in ours.iter() {
            if !theirs.contains(path) {
                out.added.push(path.clone());
            } else if self.get(path) != base.get(path) {
                out.changed.push(path.clone());
            }
        }
        out.removed = theirs.difference(&ours).cloned().collect();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_counts_adds_changes_removes() {
        let base = ConfigDocument::from_json(serde_json::json!({
            "a": 1,
            "b": { "x": 1 },
            "c": ["1", "2"],
            "gone": true
        }))
        .unwrap();
        let target = ConfigDocument::from_json(serde_json::json!({
            "a": 2,
            "b": { "x": 1, "y": 2 },
            "c": ["1", "9"],
            "d": "new"
        }))
        .unwrap();
        let d = target.diff(&base);
        assert_eq!(d.added, vec!["b.y".to_string(), "d".to_string()]);
        assert_eq!(d.changed, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(d.removed, vec!["gone".to_string()]);
        assert!(target.diff(&target).is_empty());
    }
}
