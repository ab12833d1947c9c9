//! Array reconciliation.
//!
//! Arrays of records are matched across versions by the identifier field the
//! schema names for the array's key, so reordering never shows up as a change.
//! Arrays of scalars are compared as sets of normalized values.

use crate::config::MissingIdentifierPolicy;
use crate::diff::{Change, Comparator};
use crate::error::DiffError;
use crate::tree::{Node, Record};
use std::collections::{HashMap, HashSet};
use tracing::debug;

impl Comparator<'_> {
    /// Compares the arrays stored under `field` in both versions.
    ///
    /// The first element of `previous` (or of `latest` when `previous` is empty)
    /// decides between record matching and set comparison. With record matching,
    /// elements that are not records or carry no identifier are compared as a set.
    ///
    /// Changes come out as additions and modifications in `latest` order, then
    /// deletions in `previous` order, then set changes for unidentified elements.
    pub(crate) fn reconcile(
        &self,
        field: &str,
        previous: &[Node],
        latest: &[Node],
    ) -> Result<Vec<Change>, DiffError> {
        let Some(first) = previous.first().or_else(|| latest.first()) else {
            return Ok(Vec::new());
        };
        if first.as_record().is_none() {
            return Ok(self.set_difference(previous, latest));
        }

        let identifier = match self.config.schema.identifier_for(field) {
            Some(identifier) => identifier,
            None => match self.config.missing_identifier {
                MissingIdentifierPolicy::Reject => {
                    return Err(DiffError::missing_identifier(field));
                }
                MissingIdentifierPolicy::WholeItem => {
                    debug!(field, "no identifier configured, comparing whole items");
                    return Ok(self.set_difference(previous, latest));
                }
            },
        };

        debug!(
            field,
            identifier,
            previous = previous.len(),
            latest = latest.len(),
            "matching array items"
        );

        let (old_items, old_loose) = ItemIndex::build(previous, identifier);
        let (new_items, new_loose) = ItemIndex::build(latest, identifier);
        let mut changes = Vec::new();

        for item in &new_items.items {
            match old_items.get(&item.key) {
                None => changes.push(Change::ArrayItemAddition {
                    id: self.snapshot(&item.id),
                    to: self.snapshot(&Node::Object(item.record.clone())),
                }),
                Some(old) => {
                    let difference = self.walk(&old.record, &item.record)?;
                    if !difference.is_empty() {
                        changes.push(Change::ArrayItemModification {
                            id: self.snapshot(&item.id),
                            difference,
                        });
                    }
                }
            }
        }

        for item in &old_items.items {
            if new_items.get(&item.key).is_none() {
                changes.push(Change::ArrayItemDeletion {
                    id: self.snapshot(&item.id),
                    from: self.snapshot(&Node::Object(item.record.clone())),
                });
            }
        }

        changes.extend(self.set_difference(&old_loose, &new_loose));
        Ok(changes)
    }

    /// Set comparison on normalized values, ignored fields left out. Duplicates
    /// collapse, so a change in multiplicity alone is not reported.
    fn set_difference(&self, previous: &[Node], latest: &[Node]) -> Vec<Change> {
        let ignored = &self.config.ignore_keys;
        let old: Vec<(String, &Node)> = previous
            .iter()
            .map(|n| (n.normalized_without(ignored), n))
            .collect();
        let new: Vec<(String, &Node)> = latest
            .iter()
            .map(|n| (n.normalized_without(ignored), n))
            .collect();
        let old_keys: HashSet<&str> = old.iter().map(|(key, _)| key.as_str()).collect();
        let new_keys: HashSet<&str> = new.iter().map(|(key, _)| key.as_str()).collect();

        let mut changes = Vec::new();
        let mut reported = HashSet::new();
        for (key, node) in &new {
            if !old_keys.contains(key.as_str()) && reported.insert(key.as_str()) {
                changes.push(Change::Addition {
                    to: self.snapshot(node),
                });
            }
        }

        reported.clear();
        for (key, node) in &old {
            if !new_keys.contains(key.as_str()) && reported.insert(key.as_str()) {
                changes.push(Change::Deletion {
                    from: self.snapshot(node),
                });
            }
        }
        changes
    }
}

struct IdentifiedItem {
    /// Normalized identifier, the lookup key.
    key: String,
    id: Node,
    record: Record,
}

/// Identifier to item lookup that keeps first-seen order. On duplicate
/// identifiers the later item replaces the earlier one in place.
#[derive(Default)]
struct ItemIndex {
    items: Vec<IdentifiedItem>,
    positions: HashMap<String, usize>,
}

impl ItemIndex {
    /// Splits `items` into identified records and everything else.
    fn build(items: &[Node], identifier: &str) -> (Self, Vec<Node>) {
        let mut index = ItemIndex::default();
        let mut loose = Vec::new();

        for item in items {
            let id = item
                .as_record()
                .and_then(|record| record.get(identifier))
                .filter(|id| !id.is_null());
            match (item, id) {
                (Node::Object(record), Some(id)) => index.insert(id, record.clone()),
                _ => loose.push(item.clone()),
            }
        }

        (index, loose)
    }

    fn insert(&mut self, id: Node, record: Record) {
        let key = id.normalized();
        match self.positions.get(&key) {
            Some(&position) => self.items[position] = IdentifiedItem { key, id, record },
            None => {
                self.positions.insert(key.clone(), self.items.len());
                self.items.push(IdentifiedItem { key, id, record });
            }
        }
    }

    fn get(&self, key: &str) -> Option<&IdentifiedItem> {
        self.positions.get(key).map(|&position| &self.items[position])
    }
}
