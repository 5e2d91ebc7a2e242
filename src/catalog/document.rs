use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use crate::error::SchemaDocError;

/// A parsed SchemaCrawler JSON export together with its `@uuid` index
#[derive(Debug)]
pub struct Document {
    pub root: Value,
    /// uuid -> JSON pointer into `root`
    index: HashMap<String, String>,
}

impl Document {
    pub fn new(root: Value) -> Self {
        let mut index = HashMap::new();
        collect_uuids(&root, String::new(), &mut index);
        Self { root, index }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SchemaDocError::FileReadError {
                path: path.to_path_buf(),
                source: e,
            })?;

        let root: Value =
            serde_json::from_str(&content).map_err(|e| SchemaDocError::JsonParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Self::new(root))
    }

    /// Look up an object by its `@uuid`
    pub fn get(&self, uuid: &str) -> Option<&Value> {
        self.index.get(uuid).and_then(|ptr| self.root.pointer(ptr))
    }

    /// Resolve a reference that is either an inline object or a uuid string
    pub fn resolve<'a>(&'a self, reference: &'a Value) -> Option<&'a Value> {
        match reference {
            Value::Object(_) => Some(reference),
            Value::String(uuid) => self.get(uuid),
            _ => None,
        }
    }

    pub fn uuid_count(&self) -> usize {
        self.index.len()
    }
}

/// Walk the whole tree; later occurrences of a uuid replace earlier ones
fn collect_uuids(value: &Value, pointer: String, index: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(uuid)) = map.get("@uuid") {
                index.insert(uuid.clone(), pointer.clone());
            }
            for (key, v) in map {
                let escaped = key.replace('~', "~0").replace('/', "~1");
                collect_uuids(v, format!("{}/{}", pointer, escaped), index);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                collect_uuids(v, format!("{}/{}", pointer, i), index);
            }
        }
        _ => {}
    }
}

/// True for Jackson-style `["java.util.ArrayList", [...]]` wrappers
pub fn is_java_container(value: &Value) -> bool {
    match value.as_array() {
        Some(items) if items.len() >= 2 => items[0]
            .as_str()
            .is_some_and(|tag| tag.starts_with("java.util")),
        _ => false,
    }
}

/// Return the items of a collection, unwrapping Java container pairs
pub fn unwrap_list(value: &Value) -> &[Value] {
    if is_java_container(value) {
        return value[1].as_array().map(Vec::as_slice).unwrap_or(&[]);
    }
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Return the first non-empty string among `keys`
pub fn first_str<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Read a `["class", "value"]` enum pair or a plain string
pub fn enum_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) if items.len() >= 2 => items[1]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
