//! Ordered key-fallback accessors over loosely shaped JSON objects.

use serde_json::{Map, Value};

pub(crate) type Object = Map<String, Value>;

const NESTED_STRING_KEYS: &[&str] = &["name", "title", "value"];
const NESTED_DEVELOPER_KEYS: &[&str] = &["name", "company", "title"];
const IMAGE_ID_KEYS: &[&str] = &["image_id", "imageId", "cloudinary_id"];
const NESTED_IMAGE_ID_KEYS: &[&str] = &["id", "code"];

/// Text of a primitive value. Strings are unquoted, `null` has no text.
pub(crate) fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// First non-blank string found under `keys`, in order.
pub(crate) fn read_string(object: &Object, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let resolved = match object.get(*key)? {
            Value::Object(nested) => read_string(nested, NESTED_STRING_KEYS),
            Value::Array(items) => items.first().and_then(primitive_text),
            other => primitive_text(other),
        };
        non_blank(resolved)
    })
}

/// First non-blank entry of the arrays under `keys`.
///
/// Entries may be primitives or objects carrying a `name`, `company` or
/// `title`.
pub(crate) fn read_first_array_string(object: &Object, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_array))
        .flat_map(|items| items.iter())
        .find_map(|item| match item {
            Value::Object(nested) => read_string(nested, NESTED_DEVELOPER_KEYS),
            other => non_blank(primitive_text(other)),
        })
}

/// Non-blank primitive entries of the arrays under `keys`.
pub(crate) fn read_string_array(object: &Object, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_array))
        .flat_map(|items| items.iter())
        .filter(|item| !item.is_array() && !item.is_object())
        .filter_map(|item| non_blank(primitive_text(item)))
        .collect()
}

/// Image identifier stored under one of the well-known id keys.
pub(crate) fn read_image_id(object: &Object) -> Option<String> {
    IMAGE_ID_KEYS.iter().find_map(|key| {
        let resolved = match object.get(*key)? {
            Value::Object(nested) => read_string(nested, NESTED_IMAGE_ID_KEYS),
            Value::Array(_) => None,
            other => primitive_text(other),
        };
        non_blank(resolved)
    })
}

/// First object element of the arrays under `keys`.
pub(crate) fn array_first_object<'a>(object: &'a Object, keys: &[&str]) -> Option<&'a Object> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_array))
        .find_map(|items| items.iter().find_map(Value::as_object))
}

/// First element of the array under `key`, when it is an object.
pub(crate) fn first_from_array<'a>(object: &'a Object, key: &str) -> Option<&'a Object> {
    object
        .get(key)
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn read_string_respects_key_order_and_skips_blanks() {
        let obj = object(json!({"title": "Second", "name": "  ", "label": "x"}));
        assert_eq!(read_string(&obj, &["name", "title"]).as_deref(), Some("Second"));

        let obj = object(json!({"name": "First", "title": "Second"}));
        assert_eq!(read_string(&obj, &["name", "title"]).as_deref(), Some("First"));
    }

    #[test]
    fn read_string_descends_into_objects_and_arrays() {
        let obj = object(json!({
            "developer": {"value": "Firefly"},
            "genre": ["Strategy", "RTS"],
            "rating": 4.5,
            "missing": null
        }));
        assert_eq!(read_string(&obj, &["developer"]).as_deref(), Some("Firefly"));
        assert_eq!(read_string(&obj, &["genre"]).as_deref(), Some("Strategy"));
        assert_eq!(read_string(&obj, &["rating"]).as_deref(), Some("4.5"));
        assert_eq!(read_string(&obj, &["missing"]), None);
    }

    #[test]
    fn first_array_string_accepts_nested_company_names() {
        let obj = object(json!({
            "developers": [],
            "involved_companies": [{"company": "Lighthouse"}, "Ignored"]
        }));
        assert_eq!(
            read_first_array_string(&obj, &["developers", "companies", "involved_companies"])
                .as_deref(),
            Some("Lighthouse")
        );
    }

    #[test]
    fn image_id_reads_nested_codes() {
        let obj = object(json!({"imageId": {"code": "abc123"}}));
        assert_eq!(read_image_id(&obj).as_deref(), Some("abc123"));
        assert_eq!(read_image_id(&object(json!({"image_id": ""}))), None);
    }
}
