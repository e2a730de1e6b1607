//! Structural decoder and encoder
//!
//! [`decode`] walks a [`Value`] tree and builds the matching [`Field`] /
//! [`Container`] tree: every mapping becomes a container, every sequence a
//! list. [`encode`] is the inverse walk. For any tree produced by `decode`,
//! `decode(encode(t)) == t`.
//!
//! A processor `(key, scalar) -> Field` may be supplied to translate scalar
//! leaves while decoding. It never sees containers or lists, so it cannot
//! change the shape of the tree. Scalars inside a list are passed the list's
//! key; a top-level scalar is passed the empty key.

use serde::Serialize;

use crate::container::{Container, Field};
use crate::error::ConfigResult;
use crate::value::{to_value, Map, Value};

/// Decode without a processor
pub fn decode(value: Value) -> Field {
    decode_with(value, crate::processor::identity)
}

/// Decode, passing every scalar leaf through `processor`
pub fn decode_with<P>(value: Value, mut processor: P) -> Field
where
    P: FnMut(&str, Field) -> Field,
{
    decode_keyed("", value, &mut processor)
}

/// Decode a mapping into a container
pub fn decode_map<P>(map: Map, mut processor: P) -> Container
where
    P: FnMut(&str, Field) -> Field,
{
    decode_fields(map, &mut processor)
}

/// Serialize `value` into the value model, then decode it.
///
/// Fails with `InvalidKeyKind` if any map key is not a string.
pub fn decode_from<T, P>(value: &T, processor: P) -> ConfigResult<Field>
where
    T: ?Sized + Serialize,
    P: FnMut(&str, Field) -> Field,
{
    Ok(decode_with(to_value(value)?, processor))
}

pub(crate) fn decode_keyed<P>(key: &str, value: Value, processor: &mut P) -> Field
where
    P: FnMut(&str, Field) -> Field,
{
    match value {
        Value::Object(map) => Field::Container(decode_fields(map, processor)),
        Value::Array(items) => Field::List(
            items
                .into_iter()
                .map(|item| decode_keyed(key, item, processor))
                .collect(),
        ),
        Value::Null => processor(key, Field::Null),
        Value::Bool(b) => processor(key, Field::Bool(b)),
        Value::Integer(i) => processor(key, Field::Integer(i)),
        Value::Float(f) => processor(key, Field::Float(f)),
        Value::String(s) => processor(key, Field::String(s)),
    }
}

fn decode_fields<P>(map: Map, processor: &mut P) -> Container
where
    P: FnMut(&str, Field) -> Field,
{
    let mut container = Container::new();
    for (key, value) in map {
        let field = decode_keyed(&key, value, processor);
        container.set(key, field);
    }
    container
}

/// Encode a field back into the value model
pub fn encode(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Bool(*b),
        Field::Integer(i) => Value::Integer(*i),
        Field::Float(f) => Value::Float(*f),
        Field::String(s) => Value::String(s.clone()),
        Field::List(items) => Value::Array(items.iter().map(encode).collect()),
        Field::Container(container) => encode_container(container),
    }
}

/// Encode a container as a mapping keyed by field name
pub fn encode_container(container: &Container) -> Value {
    Value::Object(
        container
            .iter()
            .map(|(name, field)| (name.to_string(), encode(field)))
            .collect(),
    )
}

impl From<&Container> for Value {
    fn from(container: &Container) -> Self {
        encode_container(container)
    }
}

impl From<&Field> for Value {
    fn from(field: &Field) -> Self {
        encode(field)
    }
}
