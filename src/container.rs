//! Dynamic attribute container
//!
//! A [`Container`] is an open record: named fields can be added, replaced
//! and removed at any time, and a field may hold another container. Trees are
//! strictly owned, so a container can never reach itself.

use std::collections::BTreeMap;
use std::fmt;

use crate::codec;
use crate::value::{float_eq, Value};

/// A single field of a [`Container`]
#[derive(Debug, Clone)]
pub enum Field {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Ordered sequence; elements may be scalars, lists or containers
    List(Vec<Field>),
    /// Nested container, exclusively owned by its parent
    Container(Container),
}

impl Field {
    /// Get the type name of this field
    pub fn type_name(&self) -> &'static str {
        match self {
            Field::Null => "null",
            Field::Bool(_) => "boolean",
            Field::Integer(_) => "integer",
            Field::Float(_) => "float",
            Field::String(_) => "string",
            Field::List(_) => "list",
            Field::Container(_) => "container",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Field::Container(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Field::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Field::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Field::Float(f) => Some(*f),
            Field::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Field]> {
        match self {
            Field::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Field::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            Field::Container(c) => Some(c),
            _ => None,
        }
    }
}

/// Structural equality; NaN floats compare equal to each other.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Field::Null, Field::Null) => true,
            (Field::Bool(a), Field::Bool(b)) => a == b,
            (Field::Integer(a), Field::Integer(b)) => a == b,
            (Field::Float(a), Field::Float(b)) => float_eq(*a, *b),
            (Field::String(a), Field::String(b)) => a == b,
            (Field::List(a), Field::List(b)) => a == b,
            (Field::Container(a), Field::Container(b)) => a == b,
            _ => false,
        }
    }
}

/// Mappings become containers, sequences become lists.
impl From<Value> for Field {
    fn from(value: Value) -> Self {
        codec::decode(value)
    }
}

impl From<Container> for Field {
    fn from(container: Container) -> Self {
        Field::Container(container)
    }
}

impl From<bool> for Field {
    fn from(b: bool) -> Self {
        Field::Bool(b)
    }
}

impl From<i32> for Field {
    fn from(i: i32) -> Self {
        Field::Integer(i.into())
    }
}

impl From<i64> for Field {
    fn from(i: i64) -> Self {
        Field::Integer(i)
    }
}

impl From<f64> for Field {
    fn from(f: f64) -> Self {
        Field::Float(f)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::String(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::String(s)
    }
}

impl<F: Into<Field>> From<Vec<F>> for Field {
    fn from(items: Vec<F>) -> Self {
        Field::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", codec::encode(self))
    }
}

/// One scalar leaf of a container tree, see [`Container::rows`]
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    /// Field names from the root down to the leaf
    pub path: Vec<&'a str>,
    pub value: &'a Field,
}

/// Open record of named fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    fields: BTreeMap<String, Field>,
}

impl Container {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a field. `None` means the field was never set, which is
    /// different from a field holding [`Field::Null`].
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Read a nested field by dotted path, e.g. `"project.build.type"`
    pub fn get_path(&self, path: &str) -> Option<&Field> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_container()?.get(segment)?;
        }
        Some(current)
    }

    /// Get a nested container field
    pub fn container(&self, name: &str) -> Option<&Container> {
        self.get(name).and_then(Field::as_container)
    }

    pub fn container_mut(&mut self, name: &str) -> Option<&mut Container> {
        self.get_mut(name).and_then(Field::as_container_mut)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set one field, returning the previous value if any
    pub fn set<K, V>(&mut self, name: K, value: V) -> Option<Field>
    where
        K: Into<String>,
        V: Into<Field>,
    {
        self.fields.insert(name.into(), value.into())
    }

    /// Set every pair, overwriting existing fields of the same name.
    ///
    /// Mapping values are materialized as nested containers exactly as the
    /// decoder does; fields not named in `pairs` are left untouched.
    pub fn update<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Field>,
    {
        for (name, value) in pairs {
            self.set(name, value);
        }
    }

    /// Like [`update`](Self::update), passing each scalar leaf through
    /// `processor` first
    pub fn update_with<I, K, P>(&mut self, pairs: I, mut processor: P)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
        P: FnMut(&str, Field) -> Field,
    {
        for (name, value) in pairs {
            let name = name.into();
            let field = codec::decode_keyed(&name, value, &mut processor);
            self.fields.insert(name, field);
        }
    }

    /// Remove a field. Removing a missing field is a no-op.
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    /// Create a child container from `attrs` and store it under `name`,
    /// replacing any existing field. Reach it afterwards with
    /// [`container_mut`](Self::container_mut).
    pub fn add_container<K, I, AK, AV>(&mut self, name: K, attrs: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (AK, AV)>,
        AK: Into<String>,
        AV: Into<Field>,
    {
        let child: Container = attrs.into_iter().collect();
        self.fields.insert(name.into(), Field::Container(child));
    }

    /// Remove every field
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in sorted name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten the tree into one row per scalar leaf.
    ///
    /// List elements each get their own row under the list's name; containers
    /// inside lists are walked with the same prefix.
    pub fn rows(&self) -> Vec<Row<'_>> {
        let mut rows = Vec::new();
        collect_rows(self, &mut Vec::new(), &mut rows);
        rows
    }
}

fn collect_rows<'a>(container: &'a Container, prefix: &mut Vec<&'a str>, rows: &mut Vec<Row<'a>>) {
    for (name, field) in container.iter() {
        prefix.push(name);
        collect_field_rows(field, prefix, rows);
        prefix.pop();
    }
}

fn collect_field_rows<'a>(field: &'a Field, prefix: &mut Vec<&'a str>, rows: &mut Vec<Row<'a>>) {
    match field {
        Field::Container(child) => collect_rows(child, prefix, rows),
        Field::List(items) => {
            for item in items {
                collect_field_rows(item, prefix, rows);
            }
        }
        scalar => rows.push(Row {
            path: prefix.clone(),
            value: scalar,
        }),
    }
}

impl<K: Into<String>, V: Into<Field>> FromIterator<(K, V)> for Container {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut container = Container::new();
        container.update(iter);
        container
    }
}

impl<K: Into<String>, V: Into<Field>> Extend<(K, V)> for Container {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.update(iter);
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", codec::encode_container(self))
    }
}
