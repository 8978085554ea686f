//! store::document
//!
//! Reading and writing the tag inside an environment document.
//!
//! Environment documents are YAML. The tag lives at a dotted key (default
//! `tag`, e.g. `image.tag` for nested layouts). Reading treats a missing
//! key, `null`, or an empty string as "no tag". Writing creates missing
//! intermediate mappings and leaves every other key in place.
//!
//! Tags are opaque text, so the tag itself must be a YAML string. An
//! unquoted `1.10` or `0x1F` parses as a number whose source text is gone,
//! and reading it is an error rather than a guess. Writing always stores a
//! string, quoted where YAML would otherwise change its meaning.
//!
//! # Example
//!
//! ```
//! use lodestar::store::document::{get_tag, set_tag};
//!
//! let doc = "replicas: 2\nimage:\n  tag: v1\n";
//! assert_eq!(get_tag(doc, "image.tag").unwrap().as_deref(), Some("v1"));
//!
//! let updated = set_tag(doc, "image.tag", "v2").unwrap().unwrap();
//! assert_eq!(get_tag(&updated, "image.tag").unwrap().as_deref(), Some("v2"));
//! assert!(updated.contains("replicas: 2"));
//!
//! // Writing the current value is a no-op
//! assert!(set_tag(&updated, "image.tag", "v2").unwrap().is_none());
//! ```

use serde_yaml_ng::{Mapping, Value};

/// Read the tag at `key`.
///
/// Returns `Ok(None)` when the key is absent, null, or an empty string.
///
/// # Errors
///
/// Returns a message if the document is not valid YAML, if the key passes
/// through a non-mapping, or if the value at the key is not a string.
pub fn get_tag(contents: &str, key: &str) -> Result<Option<String>, String> {
    let root = parse(contents)?;
    match lookup(&root, key)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(_)) => Err(unquoted(key, "number")),
        Some(Value::Bool(_)) => Err(unquoted(key, "boolean")),
        Some(_) => Err(format!("'{}' does not hold a scalar tag", key)),
    }
}

/// Set the tag at `key` to `tag`.
///
/// Returns `Ok(None)` if the document already holds `tag` as a string,
/// otherwise the re-serialized document. An unquoted number or boolean at
/// `key` is always replaced.
///
/// # Errors
///
/// Returns a message if the document is not valid YAML, is not a mapping,
/// if a segment of `key` is occupied by a non-mapping value, or if `key`
/// holds a sequence or mapping.
pub fn set_tag(contents: &str, key: &str, tag: &str) -> Result<Option<String>, String> {
    let mut root = parse(contents)?;
    match lookup(&root, key)? {
        Some(Value::String(s)) if s == tag => return Ok(None),
        Some(Value::Sequence(_)) | Some(Value::Mapping(_)) | Some(Value::Tagged(_)) => {
            return Err(format!("'{}' does not hold a scalar tag", key));
        }
        _ => {}
    }

    if root.is_null() {
        root = Value::Mapping(Mapping::new());
    }

    let segments: Vec<&str> = key.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| "empty tag key".to_string())?;

    let mut current = &mut root;
    for segment in parents {
        let map = as_mapping_mut(current, segment)?;
        let slot = map
            .entry(Value::String(segment.to_string()))
            .or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Mapping(Mapping::new());
        }
        current = slot;
    }

    as_mapping_mut(current, last)?.insert(
        Value::String(last.to_string()),
        Value::String(tag.to_string()),
    );

    serde_yaml_ng::to_string(&root)
        .map(Some)
        .map_err(|e| e.to_string())
}

fn parse(contents: &str) -> Result<Value, String> {
    if contents.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml_ng::from_str(contents).map_err(|e| e.to_string())
}

/// Walk `key` down from `root`. Missing keys and null parents yield `None`.
fn lookup<'a>(root: &'a Value, key: &str) -> Result<Option<&'a Value>, String> {
    let mut current = root;
    for segment in key.split('.') {
        match current {
            Value::Mapping(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return Ok(None),
            },
            Value::Null => return Ok(None),
            _ => return Err(format!("'{}' is not a mapping", segment)),
        }
    }
    Ok(Some(current))
}

fn unquoted(key: &str, kind: &str) -> String {
    format!(
        "'{}' holds an unquoted {}; quote the tag so it is read as written",
        key, kind
    )
}

fn as_mapping_mut<'a>(value: &'a mut Value, segment: &str) -> Result<&'a mut Mapping, String> {
    match value {
        Value::Mapping(map) => Ok(map),
        _ => Err(format!("cannot set '{}': parent is not a mapping", segment)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_top_level() {
        assert_eq!(get_tag("tag: v1\n", "tag").unwrap().as_deref(), Some("v1"));
    }

    #[test]
    fn read_missing_null_and_empty() {
        assert_eq!(get_tag("other: x\n", "tag").unwrap(), None);
        assert_eq!(get_tag("tag:\n", "tag").unwrap(), None);
        assert_eq!(get_tag("tag: \"\"\n", "tag").unwrap(), None);
        assert_eq!(get_tag("", "tag").unwrap(), None);
        assert_eq!(get_tag("image: {}\n", "image.tag").unwrap(), None);
    }

    #[test]
    fn read_unquoted_number_fails() {
        for doc in ["tag: 1.10\n", "tag: 1e3\n", "tag: 0x1F\n", "tag: 42\n"] {
            let err = get_tag(doc, "tag").unwrap_err();
            assert!(err.contains("unquoted number"), "{}: {}", doc, err);
        }
        assert!(get_tag("tag: true\n", "tag")
            .unwrap_err()
            .contains("unquoted boolean"));
    }

    #[test]
    fn read_quoted_number_verbatim() {
        assert_eq!(get_tag("tag: \"1.10\"\n", "tag").unwrap().as_deref(), Some("1.10"));
        assert_eq!(get_tag("tag: '1e3'\n", "tag").unwrap().as_deref(), Some("1e3"));
        assert_eq!(get_tag("tag: \"0x1F\"\n", "tag").unwrap().as_deref(), Some("0x1F"));
    }

    #[test]
    fn read_through_scalar_fails() {
        assert!(get_tag("image: nginx\n", "image.tag").is_err());
    }

    #[test]
    fn read_non_scalar_fails() {
        assert!(get_tag("tag: [a, b]\n", "tag").is_err());
    }

    #[test]
    fn write_preserves_other_keys() {
        let updated = set_tag("name: api\ntag: v1\nreplicas: 3\n", "tag", "v2")
            .unwrap()
            .unwrap();
        assert_eq!(get_tag(&updated, "tag").unwrap().as_deref(), Some("v2"));
        assert_eq!(get_tag(&updated, "name").unwrap().as_deref(), Some("api"));
        assert!(updated.contains("replicas: 3"));
    }

    #[test]
    fn write_creates_nested_key() {
        let updated = set_tag("name: api\n", "image.tag", "v7").unwrap().unwrap();
        assert_eq!(get_tag(&updated, "image.tag").unwrap().as_deref(), Some("v7"));
    }

    #[test]
    fn write_into_empty_document() {
        let updated = set_tag("", "tag", "v1").unwrap().unwrap();
        assert_eq!(get_tag(&updated, "tag").unwrap().as_deref(), Some("v1"));
    }

    #[test]
    fn write_same_value_is_noop() {
        assert!(set_tag("tag: v1\n", "tag", "v1").unwrap().is_none());
    }

    #[test]
    fn write_numeric_looking_tag_stays_string() {
        let updated = set_tag("tag: v1\n", "tag", "1.10").unwrap().unwrap();
        assert_eq!(get_tag(&updated, "tag").unwrap().as_deref(), Some("1.10"));
    }

    #[test]
    fn write_replaces_unquoted_number() {
        let updated = set_tag("tag: 1.10\n", "tag", "1.1").unwrap().unwrap();
        assert_eq!(get_tag(&updated, "tag").unwrap().as_deref(), Some("1.1"));

        let updated = set_tag("tag: 1.10\n", "tag", "1.10").unwrap().unwrap();
        assert_eq!(get_tag(&updated, "tag").unwrap().as_deref(), Some("1.10"));
    }

    #[test]
    fn write_over_sequence_fails() {
        assert!(set_tag("tag: [a, b]\n", "tag", "v2").is_err());
    }

    #[test]
    fn write_through_scalar_fails() {
        assert!(set_tag("image: nginx\n", "image.tag", "v2").is_err());
    }

    #[test]
    fn write_into_sequence_root_fails() {
        assert!(set_tag("- a\n- b\n", "tag", "v2").is_err());
    }
}
