use crate::lexer::Region;
use crate::schema::Schema;
use serde::Serialize;
use std::fmt::Display;

/// A scalar value held by a leaf node.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(untagged)]
pub enum Primitive {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Primitive {
    pub fn is_number(&self) -> bool {
        matches!(self, Primitive::Integer(_) | Primitive::Float(_))
    }

    /// True for integers and for floats without a fractional part.
    pub fn is_integral(&self) -> bool {
        match self {
            Primitive::Integer(_) => true,
            Primitive::Float(f) => f.fract() == 0.0,
            _ => false,
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Primitive::String(s) => write!(f, "\"{s}\""),
            Primitive::Integer(n) => write!(f, "{n}"),
            Primitive::Float(n) => {
                let text = n.to_string();
                if text.contains('.') {
                    write!(f, "{text}")
                } else {
                    write!(f, "{text}.0")
                }
            }
            Primitive::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::Integer(i64::from(value))
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Integer(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Float(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Boolean(value)
    }
}

/// A keyed child of a container node.
#[derive(Debug, PartialEq, Clone)]
pub struct Entry {
    pub key: String,
    pub value: DocumentNode,
}

#[derive(Debug, PartialEq, Clone)]
pub enum NodeKind {
    Leaf(Primitive),
    /// Ordered entries. Arrays are containers whose keys are `"0"`, `"1"`, ...
    Container { entries: Vec<Entry>, is_array: bool },
}

/// A node of the document tree: either a scalar leaf or an ordered container.
///
/// Equality is structural; regions are ignored.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    pub kind: NodeKind,
    pub region: Option<Region>,
}

impl PartialEq for DocumentNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Default for DocumentNode {
    fn default() -> Self {
        Self::object()
    }
}

impl DocumentNode {
    pub fn leaf(value: impl Into<Primitive>) -> Self {
        Self {
            kind: NodeKind::Leaf(value.into()),
            region: None,
        }
    }

    /// An empty object.
    pub fn object() -> Self {
        Self {
            kind: NodeKind::Container {
                entries: Vec::new(),
                is_array: false,
            },
            region: None,
        }
    }

    /// Builds an array node, keying the items by their index.
    pub fn from_array(items: Vec<DocumentNode>) -> Self {
        let entries = items
            .into_iter()
            .enumerate()
            .map(|(index, value)| Entry {
                key: index.to_string(),
                value,
            })
            .collect();
        Self {
            kind: NodeKind::Container {
                entries,
                is_array: true,
            },
            region: None,
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// The region of this node, or the empty region for nodes built in code.
    pub fn region_or_default(&self) -> Region {
        self.region.unwrap_or_default()
    }

    /// True for a leaf holding a scalar.
    pub fn is_single_value(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, NodeKind::Container { is_array: true, .. })
    }

    pub fn value(&self) -> Option<&Primitive> {
        match &self.kind {
            NodeKind::Leaf(value) => Some(value),
            NodeKind::Container { .. } => None,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Container { entries, .. } => entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries().iter().map(|entry| entry.key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &DocumentNode> {
        self.entries().iter().map(|entry| &entry.value)
    }

    pub fn get(&self, key: &str) -> Option<&DocumentNode> {
        self.entries()
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces a child, keeping the position of an existing key.
    /// A leaf turns into an empty object first, since a node cannot hold both.
    pub fn set(&mut self, key: impl Into<String>, value: DocumentNode) -> Option<DocumentNode> {
        if let NodeKind::Leaf(_) = self.kind {
            self.kind = NodeKind::Container {
                entries: Vec::new(),
                is_array: false,
            };
        }
        let NodeKind::Container { entries, .. } = &mut self.kind else {
            return None;
        };
        let key = key.into();
        match entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                entries.push(Entry { key, value });
                None
            }
        }
    }
}

/// The result of parsing a Lion text: the root object and the inline schema, if any.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct LionDocument {
    pub root: DocumentNode,
    pub schema: Option<Schema>,
    pub has_schema: bool,
}

impl LionDocument {
    pub fn new(root: DocumentNode) -> Self {
        Self {
            root,
            schema: None,
            has_schema: false,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self.has_schema = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<&DocumentNode> {
        self.root.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: DocumentNode) -> Option<DocumentNode> {
        self.root.set(key, value)
    }
}
