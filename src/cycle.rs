//! Circular reference detection.
//!
//! Runs as a pre-pass over each input before comparison. Records are tracked by
//! handle identity: a record that is reached again while it is still on the
//! current traversal path is a cycle and fails the comparison. Records shared by
//! several parents without forming a cycle are fine and are only walked once.

use crate::error::DiffError;
use crate::tree::{Node, Record};
use std::collections::HashSet;
use tracing::warn;

/// Fails with [`DiffError::CircularReference`] if any record reachable from
/// `root` is reachable from itself.
///
/// ```
/// use recdiff::{ensure_acyclic, Record};
///
/// let record = Record::new().with("name", "Wade Hills");
/// assert!(ensure_acyclic(&record).is_ok());
///
/// record.insert("self", record.clone());
/// assert!(ensure_acyclic(&record).is_err());
/// ```
pub fn ensure_acyclic(root: &Record) -> Result<(), DiffError> {
    let mut guard = CycleGuard::default();
    let mut path = Vec::new();
    guard.visit_record(root, &mut path)
}

#[derive(Default)]
struct CycleGuard {
    on_path: HashSet<usize>,
    finished: HashSet<usize>,
}

impl CycleGuard {
    fn visit_record(&mut self, record: &Record, path: &mut Vec<String>) -> Result<(), DiffError> {
        let identity = record.address();
        if self.finished.contains(&identity) {
            return Ok(());
        }
        if !self.on_path.insert(identity) {
            let at = render_path(path);
            warn!(path = %at, "circular reference detected");
            return Err(DiffError::circular_reference(at));
        }

        for (key, value) in record.entries() {
            path.push(key);
            self.visit_node(&value, path)?;
            path.pop();
        }

        self.on_path.remove(&identity);
        self.finished.insert(identity);
        Ok(())
    }

    fn visit_node(&mut self, node: &Node, path: &mut Vec<String>) -> Result<(), DiffError> {
        match node {
            Node::Object(record) => self.visit_record(record, path),
            Node::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    path.push(format!("[{}]", index));
                    self.visit_node(item, path)?;
                    path.pop();
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// `["store", "owners", "[0]", "self"]` renders as `store.owners[0].self`.
fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }

    let mut result = String::new();
    for (i, component) in path.iter().enumerate() {
        if !component.starts_with('[') && i > 0 {
            result.push('.');
        }
        result.push_str(component);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acyclic_record_passes() {
        let record = Record::new()
            .with("a", 1)
            .with("nested", Record::new().with("b", Node::Array(vec![Node::from(2)])));
        assert!(ensure_acyclic(&record).is_ok());
    }

    #[test]
    fn test_self_reference_detected() {
        let record = Record::new().with("name", "x");
        record.insert("self", record.clone());

        let err = ensure_acyclic(&record).unwrap_err();
        assert_eq!(err, DiffError::circular_reference("self"));
    }

    #[test]
    fn test_indirect_cycle_path() {
        let store = Record::new().with("name", "Jacques");
        let address = Record::new().with("city", "New Cordell");
        store.insert("address", address.clone());
        address.insert("postalCode", store.clone());
        let root = Record::new().with("store", store);

        let err = ensure_acyclic(&root).unwrap_err();
        assert_eq!(
            err,
            DiffError::circular_reference("store.address.postalCode")
        );
    }

    #[test]
    fn test_cycle_through_array() {
        let owner = Record::new();
        let root = Record::new().with("owners", Node::Array(vec![Node::from(owner.clone())]));
        owner.insert("root", root.clone());

        let err = ensure_acyclic(&root).unwrap_err();
        assert_eq!(err, DiffError::circular_reference("owners[0].root"));
    }

    #[test]
    fn test_shared_subrecord_is_not_a_cycle() {
        let shared = Record::new().with("code", "46");
        let root = Record::new()
            .with("phone", shared.clone())
            .with("fax", shared.clone())
            .with("list", Node::Array(vec![Node::from(shared)]));
        assert!(ensure_acyclic(&root).is_ok());
    }

    #[test]
    fn test_render_path() {
        assert_eq!(render_path(&[]), "(root)");
        assert_eq!(
            render_path(&["a".to_string(), "[2]".to_string(), "b".to_string()]),
            "a[2].b"
        );
    }
}
