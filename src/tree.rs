//! Value model for records under comparison.
//!
//! Documents are converted once at the boundary into [`Node`], a closed tagged
//! variant the engine dispatches on. Objects are held through [`Record`], a shared
//! handle: cloning a record clones the handle, so the same mapping can be reachable
//! from several places (or from itself). The engine relies on handle identity to
//! detect such cycles.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// A value in a record.
///
/// Equality is structural and terminates on cyclic values.
#[derive(Debug, Clone)]
pub enum Node {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(Record),
    Array(Vec<Node>),
}

impl Node {
    pub fn type_name(&self) -> &str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Object(_) => "object",
            Node::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Returns true for values that are neither objects nor arrays.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Node::Object(_) | Node::Array(_))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value carries data worth reporting on its own.
    ///
    /// `null`, `false`, `0`, `NaN`, `""` and `[]` are falsy. Records are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Null => false,
            Node::Bool(b) => *b,
            Node::Number(n) => *n != 0.0 && !n.is_nan(),
            Node::String(s) => !s.is_empty(),
            Node::Array(items) => !items.is_empty(),
            Node::Object(_) => true,
        }
    }

    /// String form used for scalar equality: the value's textual rendering with
    /// surrounding whitespace removed.
    ///
    /// Integral numbers render without a fraction, so `1`, `1.0` and `"1"` all
    /// normalize to `"1"`. Magnitudes from `1e21` up and below `1e-6` use
    /// exponent form (`1e+21`, `1.5e-7`). Containers fall back to their
    /// canonical form.
    pub fn normalized(&self) -> String {
        self.normalized_without(&HashSet::new())
    }

    /// Like [`Node::normalized`], with the given field names dropped from
    /// containers at every depth.
    pub fn normalized_without(&self, ignored: &HashSet<String>) -> String {
        match self {
            Node::Null => "null".to_string(),
            Node::Bool(b) => b.to_string(),
            Node::Number(n) => format_number(*n),
            Node::String(s) => s.trim().to_string(),
            Node::Object(_) | Node::Array(_) => self.canonical_json(ignored).to_string(),
        }
    }

    /// Detached JSON snapshot of this value.
    pub fn to_json(&self) -> Value {
        self.to_json_without(&HashSet::new())
    }

    /// Detached JSON snapshot with the given field names dropped at every depth.
    ///
    /// The input must be acyclic.
    pub fn to_json_without(&self, ignored: &HashSet<String>) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => number_to_json(*n),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json_without(ignored))
                    .collect(),
            ),
            Node::Object(record) => {
                let map: serde_json::Map<String, Value> = record
                    .entries()
                    .into_iter()
                    .filter(|(key, _)| !ignored.contains(key))
                    .map(|(key, value)| {
                        let json = value.to_json_without(ignored);
                        (key, json)
                    })
                    .collect();
                Value::Object(map)
            }
        }
    }

    /// JSON rendering with object keys sorted, used as a set key for containers.
    fn canonical_json(&self, ignored: &HashSet<String>) -> Value {
        match self {
            Node::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.canonical_json(ignored))
                    .collect(),
            ),
            Node::Object(record) => {
                let mut entries = record.entries();
                entries.retain(|(key, _)| !ignored.contains(key));
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                Value::Object(
                    entries
                        .into_iter()
                        .map(|(key, value)| (key, value.canonical_json(ignored)))
                        .collect(),
                )
            }
            scalar => scalar.to_json(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n == 0.0 {
        // covers -0
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }
    n.to_string()
}

fn number_to_json(n: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Fields {
    order: Vec<String>,
    values: HashMap<String, Node>,
}

/// Shared handle to an insertion-ordered mapping of field names to values.
///
/// Records are built through `&self` so a record can be linked into itself:
///
/// ```
/// use recdiff::Record;
///
/// let store = Record::new().with("name", "Jacques");
/// let address = Record::new().with("city", "New Cordell");
/// store.insert("address", address.clone());
/// address.insert("owner", store.clone());
///
/// assert!(store.get("address").is_some());
/// ```
#[derive(Clone, Default)]
pub struct Record(Rc<RefCell<Fields>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, keeping its original position if it already existed.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        let key = key.into();
        let mut fields = self.0.borrow_mut();
        if !fields.values.contains_key(&key) {
            fields.order.push(key.clone());
        }
        fields.values.insert(key, value.into())
    }

    /// Chainable form of [`Record::insert`].
    pub fn with(self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns a copy of the field's value. Nested records come back as handles.
    pub fn get(&self, key: &str) -> Option<Node> {
        self.0.borrow().values.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().order.clone()
    }

    /// Fields in insertion order.
    pub fn entries(&self) -> Vec<(String, Node)> {
        let fields = self.0.borrow();
        fields
            .order
            .iter()
            .filter_map(|key| fields.values.get(key).map(|v| (key.clone(), v.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both handles point at the same mapping.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the underlying mapping, stable for the record's lifetime.
    pub(crate) fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Record {
    /// Structural equality, ignoring key order.
    fn eq(&self, other: &Self) -> bool {
        records_equal(self, other, &mut HashSet::new())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        nodes_equal(self, other, &mut HashSet::new())
    }
}

/// Record pairs already under comparison in `assumed` count as equal, so two
/// cycles of the same shape compare equal instead of recursing forever.
fn records_equal(a: &Record, b: &Record, assumed: &mut HashSet<(usize, usize)>) -> bool {
    if a.ptr_eq(b) || !assumed.insert((a.address(), b.address())) {
        return true;
    }
    a.len() == b.len()
        && a.entries().iter().all(|(key, value)| {
            b.get(key)
                .is_some_and(|other| nodes_equal(value, &other, assumed))
        })
}

fn nodes_equal(a: &Node, b: &Node, assumed: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Node::Null, Node::Null) => true,
        (Node::Bool(x), Node::Bool(y)) => x == y,
        (Node::Number(x), Node::Number(y)) => x == y,
        (Node::String(x), Node::String(y)) => x == y,
        (Node::Array(xs), Node::Array(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| nodes_equal(x, y, assumed))
        }
        (Node::Object(x), Node::Object(y)) => records_equal(x, y, assumed),
        _ => false,
    }
}

impl fmt::Debug for Record {
    // Keys only: records may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record").field("keys", &self.keys()).finish()
    }
}

impl FromIterator<(String, Node)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl From<Record> for Node {
    fn from(record: Record) -> Self {
        Node::Object(record)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Number(n)
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Number(n as f64)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(n as f64)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Null, Into::into)
    }
}
