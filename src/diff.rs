//! Record comparison engine.
//!
//! [`compare_records`] walks two versions of a record key by key and returns a
//! [`DiffTree`] naming only what changed. Arrays are handed to the reconciler in
//! `array`, object/null transitions to the flattener in `transition`, and both
//! inputs are checked for cycles by [`crate::cycle`] before any walking starts.
//!
//! # Examples
//!
//! ```
//! use recdiff::{compare_records, Change, DiffConfig, DiffEntry, Record};
//! use serde_json::json;
//!
//! let previous = Record::new().with("a", 1).with("b", Record::new().with("x", 1));
//! let latest = Record::new().with("a", 2).with("b", Record::new().with("x", 1));
//!
//! let diff = compare_records(&previous, &latest, &DiffConfig::default()).unwrap();
//!
//! assert_eq!(diff.len(), 1);
//! assert_eq!(
//!     diff.get("a"),
//!     Some(&DiffEntry::Change(Change::Modification { from: json!(1), to: json!(2) }))
//! );
//! ```

use crate::config::DiffConfig;
use crate::cycle::ensure_acyclic;
use crate::error::DiffError;
use crate::transition::Direction;
use crate::tree::{Node, Record};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Stand-in for the missing side of an addition or deletion.
pub const PLACEHOLDER: &str = "-";

/// The manner of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Addition,
    Deletion,
    Modification,
    ArrayItemAddition,
    ArrayItemDeletion,
    ArrayItemModification,
}

impl ChangeKind {
    /// Tag written to `mannerOfChange`. Array item kinds share the field-level tags.
    pub fn manner(self) -> &'static str {
        match self {
            ChangeKind::Addition | ChangeKind::ArrayItemAddition => "ADDITION",
            ChangeKind::Deletion | ChangeKind::ArrayItemDeletion => "DELETION",
            ChangeKind::Modification | ChangeKind::ArrayItemModification => "MODIFICATION",
        }
    }
}

/// A single detected change.
///
/// Values are detached JSON snapshots of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Addition { to: Value },
    Deletion { from: Value },
    Modification { from: Value, to: Value },
    ArrayItemAddition { id: Value, to: Value },
    ArrayItemDeletion { id: Value, from: Value },
    ArrayItemModification { id: Value, difference: DiffTree },
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Addition { .. } => ChangeKind::Addition,
            Change::Deletion { .. } => ChangeKind::Deletion,
            Change::Modification { .. } => ChangeKind::Modification,
            Change::ArrayItemAddition { .. } => ChangeKind::ArrayItemAddition,
            Change::ArrayItemDeletion { .. } => ChangeKind::ArrayItemDeletion,
            Change::ArrayItemModification { .. } => ChangeKind::ArrayItemModification,
        }
    }

    /// Identifier of the matched array item, for array item changes.
    pub fn identifier(&self) -> Option<&Value> {
        match self {
            Change::ArrayItemAddition { id, .. }
            | Change::ArrayItemDeletion { id, .. }
            | Change::ArrayItemModification { id, .. } => Some(id),
            _ => None,
        }
    }

    fn accumulate(&self, stats: &mut DiffStats) {
        match self {
            Change::Addition { .. } | Change::ArrayItemAddition { .. } => stats.added += 1,
            Change::Deletion { .. } | Change::ArrayItemDeletion { .. } => stats.removed += 1,
            Change::Modification { .. } => stats.modified += 1,
            Change::ArrayItemModification { difference, .. } => difference.accumulate(stats),
        }
    }
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(id) = self.identifier() {
            map.serialize_entry("arrayItemIdentifier", id)?;
        }
        map.serialize_entry("mannerOfChange", self.kind().manner())?;
        match self {
            Change::Addition { to } => {
                map.serialize_entry("initialValue", PLACEHOLDER)?;
                map.serialize_entry("latestValue", to)?;
            }
            Change::Deletion { from } => {
                map.serialize_entry("initialValue", from)?;
                map.serialize_entry("latestValue", PLACEHOLDER)?;
            }
            Change::Modification { from, to } => {
                map.serialize_entry("initialValue", from)?;
                map.serialize_entry("latestValue", to)?;
            }
            Change::ArrayItemAddition { to, .. } => map.serialize_entry("latestValue", to)?,
            Change::ArrayItemDeletion { from, .. } => map.serialize_entry("initialValue", from)?,
            Change::ArrayItemModification { difference, .. } => {
                map.serialize_entry("difference", difference)?
            }
        }
        map.end()
    }
}

/// What a changed key maps to in a [`DiffTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEntry {
    /// A leaf change.
    Change(Change),
    /// Changes inside a nested record.
    Nested(DiffTree),
    /// Changes inside an array, in emission order.
    Array(Vec<Change>),
}

impl DiffEntry {
    pub fn as_change(&self) -> Option<&Change> {
        match self {
            DiffEntry::Change(change) => Some(change),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&DiffTree> {
        match self {
            DiffEntry::Nested(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Change]> {
        match self {
            DiffEntry::Array(changes) => Some(changes),
            _ => None,
        }
    }
}

impl Serialize for DiffEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DiffEntry::Change(change) => change.serialize(serializer),
            DiffEntry::Nested(tree) => tree.serialize(serializer),
            DiffEntry::Array(changes) => changes.serialize(serializer),
        }
    }
}

/// Changed keys of a record, in first-seen order.
///
/// Never holds an entry for an unchanged key, and never holds an empty nested tree
/// or an empty change list. Equality ignores key order.
#[derive(Debug, Clone, Default)]
pub struct DiffTree {
    entries: Vec<(String, DiffEntry)>,
}

impl DiffTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of changed keys at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&DiffEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }

    /// Follows nested trees along `path`.
    pub fn lookup(&self, path: &[&str]) -> Option<&DiffEntry> {
        let (last, parents) = path.split_last()?;
        let mut tree = self;
        for key in parents {
            tree = tree.get(key)?.as_nested()?;
        }
        tree.get(last)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiffEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Counts of leaf changes at every depth.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::new();
        self.accumulate(&mut stats);
        stats
    }

    pub(crate) fn insert(&mut self, key: String, entry: DiffEntry) {
        debug_assert!(self.get(&key).is_none(), "duplicate diff key {}", key);
        self.entries.push((key, entry));
    }

    fn accumulate(&self, stats: &mut DiffStats) {
        for (_, entry) in &self.entries {
            match entry {
                DiffEntry::Change(change) => change.accumulate(stats),
                DiffEntry::Nested(tree) => tree.accumulate(stats),
                DiffEntry::Array(changes) => {
                    for change in changes {
                        change.accumulate(stats);
                    }
                }
            }
        }
    }
}

impl PartialEq for DiffTree {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, entry)| other.get(key) == Some(entry))
    }
}

impl Serialize for DiffTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// Leaf change counts for a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffStats {
    /// Additions, including added array items
    pub added: usize,
    /// Deletions, including deleted array items
    pub removed: usize,
    /// Modified leaves, including those inside modified array items
    pub modified: usize,
}

impl DiffStats {
    pub fn new() -> Self {
        Self {
            added: 0,
            removed: 0,
            modified: 0,
        }
    }

    pub fn total_changes(&self) -> usize {
        self.added + self.removed + self.modified
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

impl Default for DiffStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares two versions of a record.
///
/// Both inputs are first checked for cycles; a record reachable from itself fails
/// the whole comparison with [`DiffError::CircularReference`]. Neither input is
/// modified.
pub fn compare_records(
    previous: &Record,
    latest: &Record,
    config: &DiffConfig,
) -> Result<DiffTree, DiffError> {
    debug!("checking inputs for circular references");
    ensure_acyclic(previous)?;
    ensure_acyclic(latest)?;

    let tree = Comparator::new(config).walk(previous, latest)?;
    debug!(changed_keys = tree.len(), "comparison finished");
    Ok(tree)
}

/// Compares two parsed documents whose roots should be records.
///
/// A null root counts as an empty record. Any other root fails with
/// [`DiffError::MalformedInput`].
pub fn compare_nodes(
    previous: &Node,
    latest: &Node,
    config: &DiffConfig,
) -> Result<DiffTree, DiffError> {
    let previous = root_record(previous, "previous")?;
    let latest = root_record(latest, "latest")?;
    compare_records(&previous, &latest, config)
}

fn root_record(node: &Node, side: &str) -> Result<Record, DiffError> {
    match node {
        Node::Object(record) => Ok(record.clone()),
        Node::Null => Ok(Record::new()),
        other => Err(DiffError::malformed_input(side, other.type_name())),
    }
}

/// Per-call comparison state shared by the walker, reconciler and flattener.
pub(crate) struct Comparator<'a> {
    pub(crate) config: &'a DiffConfig,
}

impl<'a> Comparator<'a> {
    pub(crate) fn new(config: &'a DiffConfig) -> Self {
        Self { config }
    }

    /// Compares two records key by key. Null and absent values are treated alike.
    pub(crate) fn walk(&self, previous: &Record, latest: &Record) -> Result<DiffTree, DiffError> {
        let mut tree = DiffTree::new();
        if previous.ptr_eq(latest) {
            return Ok(tree);
        }

        for key in union_keys(previous, latest) {
            if self.config.is_ignored(&key) {
                continue;
            }
            let old = previous.get(&key).filter(|node| !node.is_null());
            let new = latest.get(&key).filter(|node| !node.is_null());
            trace!(key = %key, "comparing field");

            if let Some(entry) = self.compare_field(&key, old.as_ref(), new.as_ref())? {
                tree.insert(key, entry);
            }
        }

        Ok(tree)
    }

    fn compare_field(
        &self,
        key: &str,
        old: Option<&Node>,
        new: Option<&Node>,
    ) -> Result<Option<DiffEntry>, DiffError> {
        let entry = match (old, new) {
            (None, None) => None,
            (Some(Node::Array(old_items)), Some(Node::Array(new_items))) => {
                let changes = self.reconcile(key, old_items, new_items)?;
                (!changes.is_empty()).then_some(DiffEntry::Array(changes))
            }
            (Some(Node::Object(record)), None) => {
                debug!(field = key, "flattening removed object");
                nested(self.flatten(record, Direction::Deletion))
            }
            (None, Some(Node::Object(record))) => {
                debug!(field = key, "flattening added object");
                nested(self.flatten(record, Direction::Addition))
            }
            (Some(Node::Object(old_record)), Some(Node::Object(new_record))) => {
                nested(self.walk(old_record, new_record)?)
            }
            (None, Some(value)) => Some(DiffEntry::Change(Change::Addition {
                to: self.snapshot(value),
            })),
            (Some(value), None) => Some(DiffEntry::Change(Change::Deletion {
                from: self.snapshot(value),
            })),
            (Some(old_value), Some(new_value)) => {
                let changed = if old_value.is_scalar() && new_value.is_scalar() {
                    old_value.normalized() != new_value.normalized()
                } else {
                    debug!(
                        field = key,
                        from = old_value.type_name(),
                        to = new_value.type_name(),
                        "value changed shape"
                    );
                    true
                };
                changed.then(|| {
                    DiffEntry::Change(Change::Modification {
                        from: self.snapshot(old_value),
                        to: self.snapshot(new_value),
                    })
                })
            }
        };
        Ok(entry)
    }

    /// Detached copy of a value for the output, without ignored fields.
    pub(crate) fn snapshot(&self, node: &Node) -> Value {
        node.to_json_without(&self.config.ignore_keys)
    }
}

fn nested(tree: DiffTree) -> Option<DiffEntry> {
    (!tree.is_empty()).then_some(DiffEntry::Nested(tree))
}

/// Keys of `previous` in order, followed by keys only `latest` has.
fn union_keys(previous: &Record, latest: &Record) -> Vec<String> {
    let mut seen = HashSet::new();
    previous
        .keys()
        .into_iter()
        .chain(latest.keys())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
