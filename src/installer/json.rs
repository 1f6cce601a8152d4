//! Merging entries into a JSON manifest object.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::error::{InstrumentorError, Result};

/// Add `entries` to the `section` object of a JSON manifest.
///
/// Keys that already exist keep their value. Returns `None` when nothing
/// was added, otherwise the re-serialized document indented with `indent`
/// and terminated by a newline.
pub(crate) fn merge_section(
    path: &Path,
    content: &str,
    section: &str,
    entries: &[(String, String)],
    indent: &[u8],
) -> Result<Option<String>> {
    let malformed = |message: String| InstrumentorError::MalformedManifest {
        path: path.to_path_buf(),
        message,
    };

    let mut doc: Value = serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;
    let root = doc
        .as_object_mut()
        .ok_or_else(|| malformed("top-level value is not an object".to_string()))?;

    let target = root
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Some(object) = target.as_object_mut() else {
        return Err(malformed(format!("'{section}' is not an object")));
    };

    let mut added = 0;
    for (name, version) in entries {
        if !object.contains_key(name) {
            object.insert(name.clone(), Value::String(version.clone()));
            added += 1;
        }
    }
    if added == 0 {
        return Ok(None);
    }

    let mut buf = Vec::with_capacity(content.len() + 64);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent));
    doc.serialize(&mut serializer)
        .map_err(|e| malformed(e.to_string()))?;
    buf.push(b'\n');

    Ok(Some(String::from_utf8(buf).map_err(anyhow::Error::from)?))
}
