use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use std::io::{Read, Write};

use serde_json::{Map, Number, Value};

use crate::format::{FormatAdapter, TypeTag};
use crate::impls::boxed_default;
use crate::info::{NonGenericInfoCell, OpaqueInfo, TypeInfo, TypePath};
use crate::scalar::Scalar;
use crate::value::{ValueRef, impl_classify_cast};
use crate::{Classify, ClassifyError, Typed};

// -----------------------------------------------------------------------------
// Markers

const TYPE: &str = ":type";
const FULL_TYPE: &str = ":fulltype";
const ID: &str = ":id";
const REF: &str = ":ref";
const FOLLOW: &str = ":follow";
const VALUE: &str = ":value";

// -----------------------------------------------------------------------------
// JsonFormat

/// A [`FormatAdapter`] over [`serde_json::Value`].
///
/// Wrappers are written as `:`-prefixed keys. They are merged into JSON
/// objects, and placed next to a `":value"` key for any other payload:
///
/// ```
/// use cf_engine::format::{FormatAdapter, JsonFormat, TypeTag};
/// use serde_json::json;
///
/// let format = JsonFormat::new();
/// let tagged = format.format_with_type(json!(3), &TypeTag::short("u8"));
/// assert_eq!(tagged, json!({ ":type": "u8", ":value": 3 }));
///
/// let object = format.format_referable(json!({ "a": 1 }), "1");
/// assert_eq!(object, json!({ ":id": "1", "a": 1 }));
/// ```
///
/// Dictionary keys starting with `:` are escaped by doubling the colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonFormat {
    pretty: bool,
}

impl Default for JsonFormat {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormat {
    /// Indented output.
    #[inline]
    pub const fn new() -> Self {
        Self { pretty: true }
    }

    /// Single-line output.
    #[inline]
    pub const fn compact() -> Self {
        Self { pretty: false }
    }

    fn marker<'e>(element: &'e Value, key: &str) -> Option<&'e Value> {
        element.as_object().and_then(|map| map.get(key))
    }

    fn as_object<'e>(element: &'e Value, expected: &str) -> Result<&'e Map<String, Value>, ClassifyError> {
        element
            .as_object()
            .ok_or_else(|| ClassifyError::malformed(format!("expected {expected}, found {}", kind(element))))
    }

    /// Add `key` to `inner`, merged when `inner` is an object that does
    /// not have it yet.
    fn wrap(inner: Value, key: &str, marker: Value) -> Value {
        let mut map = Map::new();
        map.insert(key.to_string(), marker);
        match inner {
            Value::Object(fields) if !fields.contains_key(key) => map.extend(fields),
            other => {
                map.insert(VALUE.to_string(), other);
            }
        }
        Value::Object(map)
    }
}

fn kind(element: &Value) -> &'static str {
    match element {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn is_marker(key: &str) -> bool {
    key.starts_with(':') && !key.starts_with("::")
}

fn escape_key(key: String) -> String {
    if key.starts_with(':') {
        format!(":{key}")
    } else {
        key
    }
}

fn unescape_key(key: &str) -> &str {
    if key.starts_with("::") { &key[1..] } else { key }
}

fn from_json_error(err: serde_json::Error) -> ClassifyError {
    if err.is_io() {
        ClassifyError::from(std::io::Error::from(err))
    } else {
        ClassifyError::Malformed(err.to_string())
    }
}

impl FormatAdapter for JsonFormat {
    type Element = Value;

    #[inline]
    fn extension(&self) -> &str {
        "json"
    }

    fn read_element(&self, reader: &mut dyn Read) -> Result<Value, ClassifyError> {
        serde_json::from_reader(reader).map_err(from_json_error)
    }

    fn write_element(&self, element: &Value, writer: &mut dyn Write) -> Result<(), ClassifyError> {
        if self.pretty {
            serde_json::to_writer_pretty(writer, element).map_err(from_json_error)
        } else {
            serde_json::to_writer(writer, element).map_err(from_json_error)
        }
    }

    // -------------------------------------------------------------------------
    // Decode

    #[inline]
    fn is_null(&self, element: &Value) -> bool {
        element.is_null()
    }

    fn get_simple_value(&self, element: &Value) -> Result<Scalar, ClassifyError> {
        match element {
            Value::Bool(v) => Ok(Scalar::Bool(*v)),
            Value::String(s) => Ok(Scalar::Str(s.clone())),
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Ok(Scalar::Unsigned(v as u128))
                } else if let Some(v) = n.as_i64() {
                    Ok(Scalar::Signed(v as i128))
                } else {
                    n.as_f64()
                        .map(Scalar::Float)
                        .ok_or_else(|| ClassifyError::malformed(format!("unsupported number {n}")))
                }
            }
            other => Err(ClassifyError::malformed(format!(
                "expected a scalar, found {}",
                kind(other)
            ))),
        }
    }

    fn get_list<'e>(
        &self,
        element: &'e Value,
        _expected: Option<usize>,
    ) -> Result<Vec<&'e Value>, ClassifyError> {
        match element {
            Value::Array(items) => Ok(items.iter().collect()),
            other => Err(ClassifyError::malformed(format!(
                "expected an array, found {}",
                kind(other)
            ))),
        }
    }

    fn get_key_value_pair<'e>(&self, element: &'e Value) -> Result<(&'e Value, &'e Value), ClassifyError> {
        let map = Self::as_object(element, "a key-value pair")?;
        match (map.get("key"), map.get("value")) {
            (Some(key), Some(value)) => Ok((key, value)),
            _ => Err(ClassifyError::malformed("a key-value pair needs `key` and `value`")),
        }
    }

    fn get_dictionary<'e>(&self, element: &'e Value) -> Result<Vec<(Scalar, &'e Value)>, ClassifyError> {
        let map = Self::as_object(element, "a dictionary")?;
        Ok(map
            .iter()
            .filter(|(key, _)| !is_marker(key))
            .map(|(key, value)| (Scalar::from(unescape_key(key)), value))
            .collect())
    }

    #[inline]
    fn has_field(&self, element: &Value, name: &str) -> bool {
        Self::marker(element, name).is_some()
    }

    #[inline]
    fn get_field<'e>(&self, element: &'e Value, name: &str) -> Option<&'e Value> {
        Self::marker(element, name)
    }

    fn get_type_tag(&self, element: &Value) -> Option<TypeTag> {
        if let Some(Value::String(name)) = Self::marker(element, TYPE) {
            return Some(TypeTag::short(name.as_str()));
        }
        match Self::marker(element, FULL_TYPE) {
            Some(Value::String(path)) => Some(TypeTag::full(path.as_str())),
            _ => None,
        }
    }

    #[inline]
    fn is_reference(&self, element: &Value) -> bool {
        Self::marker(element, REF).is_some()
    }

    #[inline]
    fn is_referable(&self, element: &Value) -> bool {
        Self::marker(element, ID).is_some()
    }

    #[inline]
    fn is_follow_id(&self, element: &Value) -> bool {
        Self::marker(element, FOLLOW).is_some()
    }

    fn get_reference_id(&self, element: &Value) -> Result<String, ClassifyError> {
        let id = Self::marker(element, REF)
            .or_else(|| Self::marker(element, FOLLOW))
            .or_else(|| Self::marker(element, ID));
        match id {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(ClassifyError::malformed("element carries no id")),
        }
    }

    #[inline]
    fn unwrap_value<'e>(&self, element: &'e Value) -> &'e Value {
        Self::marker(element, VALUE).unwrap_or(element)
    }

    // -------------------------------------------------------------------------
    // Encode

    #[inline]
    fn format_null(&self) -> Value {
        Value::Null
    }

    fn format_simple_value(&self, value: &Scalar) -> Value {
        match value {
            Scalar::Bool(v) => Value::Bool(*v),
            Scalar::Signed(v) => match i64::try_from(*v) {
                Ok(v) => Value::Number(Number::from(v)),
                Err(_) => Value::String(v.to_string()),
            },
            Scalar::Unsigned(v) => match u64::try_from(*v) {
                Ok(v) => Value::Number(Number::from(v)),
                Err(_) => Value::String(v.to_string()),
            },
            Scalar::Float(v) => match Number::from_f64(*v) {
                Some(n) => Value::Number(n),
                None => Value::String(v.to_string()),
            },
            Scalar::Char(v) => Value::String(v.to_string()),
            Scalar::Str(v) => Value::String(v.clone()),
        }
    }

    #[inline]
    fn format_list(&self, _is_tuple: bool, items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn format_key_value_pair(&self, key: Value, value: Value) -> Value {
        let mut map = Map::new();
        map.insert("key".to_string(), key);
        map.insert("value".to_string(), value);
        Value::Object(map)
    }

    fn format_dictionary(&self, entries: Vec<(Scalar, Value)>) -> Value {
        Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (escape_key(key.to_key_string()), value))
                .collect(),
        )
    }

    fn format_object(&self, fields: Vec<(&str, Value)>) -> Value {
        Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    fn format_follow_id(&self, id: &str) -> Value {
        let mut map = Map::new();
        map.insert(FOLLOW.to_string(), Value::from(id));
        Value::Object(map)
    }

    fn format_reference(&self, id: &str) -> Value {
        let mut map = Map::new();
        map.insert(REF.to_string(), Value::from(id));
        Value::Object(map)
    }

    #[inline]
    fn format_referable(&self, inner: Value, id: &str) -> Value {
        Self::wrap(inner, ID, Value::from(id))
    }

    fn format_with_type(&self, inner: Value, tag: &TypeTag) -> Value {
        let key = if tag.fully_qualified { FULL_TYPE } else { TYPE };
        Self::wrap(inner, key, Value::from(tag.name.as_str()))
    }
}

// -----------------------------------------------------------------------------
// Value as a self type

impl TypePath for Value {
    #[inline]
    fn type_path() -> &'static str {
        "serde_json::Value"
    }

    #[inline]
    fn type_name() -> &'static str {
        "Value"
    }
}

impl Typed for Value {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericInfoCell = NonGenericInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Value>(Some(boxed_default::<Value>))))
    }
}

impl Classify for Value {
    impl_classify_cast!();

    #[inline]
    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::Opaque
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use serde_json::json;

    use super::JsonFormat;
    use crate::format::{FormatAdapter, TypeTag};
    use crate::scalar::Scalar;

    #[test]
    fn dictionary_keys_are_escaped() {
        let format = JsonFormat::new();
        let dict = format.format_dictionary(Vec::from([
            (Scalar::from(":id"), json!(1)),
            (Scalar::Unsigned(2), json!(2)),
        ]));
        assert_eq!(dict, json!({ "::id": 1, "2": 2 }));

        let tagged = format.format_referable(dict, "7");
        let entries = format.get_dictionary(&tagged).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Scalar::from(":id"));
        assert_eq!(format.get_reference_id(&tagged).unwrap(), "7");
    }

    #[test]
    fn wrappers_compose() {
        let format = JsonFormat::new();
        let inner = format.format_with_type(json!([1, 2]), &TypeTag::full("a::B"));
        let outer = format.format_referable(inner, "3");
        assert_eq!(outer, json!({ ":id": "3", ":fulltype": "a::B", ":value": [1, 2] }));

        assert!(format.is_referable(&outer));
        assert_eq!(format.get_type_tag(&outer), Some(TypeTag::full("a::B")));
        assert_eq!(format.unwrap_value(&outer), &json!([1, 2]));
    }

    #[test]
    fn scalars() {
        let format = JsonFormat::new();
        assert_eq!(format.format_simple_value(&Scalar::Signed(-5)), json!(-5));
        assert_eq!(
            format.format_simple_value(&Scalar::Unsigned(u128::MAX)),
            json!(u128::MAX.to_string())
        );
        assert_eq!(format.format_simple_value(&Scalar::Float(f64::INFINITY)), json!("inf"));
        assert_eq!(format.get_simple_value(&json!(7)).unwrap(), Scalar::Unsigned(7));
        assert_eq!(format.get_simple_value(&json!(-7)).unwrap(), Scalar::Signed(-7));
        assert_eq!(format.get_simple_value(&json!(0.5)).unwrap(), Scalar::Float(0.5));
        assert!(format.get_simple_value(&json!([])).is_err());
    }

    #[test]
    fn streams() {
        let format = JsonFormat::compact();
        let mut out = Vec::new();
        format.write_element(&json!({ "a": [1] }), &mut out).unwrap();
        assert_eq!(String::from_utf8(out.clone()).unwrap(), r#"{"a":[1]}"#);

        let back = format.read_element(&mut out.as_slice()).unwrap();
        assert_eq!(back, json!({ "a": [1] }));
        assert!(format.read_element(&mut "{".as_bytes()).is_err());
    }
}
