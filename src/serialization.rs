use crate::ast::{DocumentNode, NodeKind, Primitive};
use serde::Serialize;
use std::collections::BTreeMap;

/// A plain data tree, detached from regions and node order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl From<&Primitive> for Value {
    fn from(primitive: &Primitive) -> Self {
        match primitive {
            Primitive::String(s) => Value::String(s.clone()),
            Primitive::Integer(n) => Value::Integer(*n),
            Primitive::Float(n) => Value::Float(*n),
            Primitive::Boolean(b) => Value::Boolean(*b),
        }
    }
}

pub(crate) fn to_value(node: &DocumentNode) -> Value {
    match &node.kind {
        NodeKind::Leaf(primitive) => Value::from(primitive),
        NodeKind::Container {
            entries,
            is_array: true,
        } => Value::Array(entries.iter().map(|entry| to_value(&entry.value)).collect()),
        NodeKind::Container { entries, .. } => Value::Object(
            entries
                .iter()
                .map(|entry| (entry.key.clone(), to_value(&entry.value)))
                .collect(),
        ),
    }
}
