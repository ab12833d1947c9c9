//! Object/null transition flattening.
//!
//! When a field holds a record in one version and nothing in the other, the
//! record is expanded into leaf-level additions or deletions instead of a single
//! coarse change, so reviewers see which nested fields carried data.

use crate::diff::{Change, Comparator, DiffEntry, DiffTree};
use crate::tree::{Node, Record};
use serde_json::Value;

/// Which side of the comparison holds the record being flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// The record only exists in the latest version.
    Addition,
    /// The record only exists in the previous version.
    Deletion,
}

impl Direction {
    fn change(self, value: Value) -> Change {
        match self {
            Direction::Addition => Change::Addition { to: value },
            Direction::Deletion => Change::Deletion { from: value },
        }
    }
}

impl Comparator<'_> {
    /// Expands `record` into leaf changes. Falsy leaves are left out, as are
    /// nested records with nothing truthy inside.
    pub(crate) fn flatten(&self, record: &Record, direction: Direction) -> DiffTree {
        let mut tree = DiffTree::new();

        for (key, value) in record.entries() {
            if self.config.is_ignored(&key) {
                continue;
            }
            match &value {
                Node::Object(nested) => {
                    let subtree = self.flatten(nested, direction);
                    if !subtree.is_empty() {
                        tree.insert(key, DiffEntry::Nested(subtree));
                    }
                }
                leaf if leaf.is_truthy() => {
                    let change = direction.change(self.snapshot(leaf));
                    tree.insert(key, DiffEntry::Change(change));
                }
                _ => {}
            }
        }

        tree
    }
}
