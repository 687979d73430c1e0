//! On-disk common pipeline environment.
//!
//! Each file below the root is one entry. `*.json` files hold JSON values and
//! are keyed without their suffix; every other file is a plain string.

use piper_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Entries of the common pipeline environment, keyed by relative path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CpeMap(BTreeMap<String, Value>);

impl CpeMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file below `root`.
    ///
    /// Keys are the `/`-joined path relative to `root`. A missing `root`
    /// yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be read or a `*.json` file does
    /// not contain valid JSON.
    pub fn load_from_disk(root: &Path) -> Result<Self> {
        let mut map = Self::new();
        if !root.exists() {
            debug!(path = %root.display(), "No pipeline environment on disk");
            return Ok(map);
        }

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(root).map_err(|_| {
                Error::configuration(format!(
                    "path {} is not under {}",
                    path.display(),
                    root.display()
                ))
            })?;
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let content = fs::read(path)?;
            match key.strip_suffix(".json") {
                Some(stem) => {
                    let value: Value = serde_json::from_slice(&content)?;
                    map.insert(stem, value);
                }
                None => map.insert(
                    key,
                    Value::String(String::from_utf8_lossy(&content).into_owned()),
                ),
            }
        }
        debug!(path = %root.display(), entries = map.len(), "Loaded pipeline environment");
        Ok(map)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON with tab indentation and a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_indented_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        out.push(b'\n');
        String::from_utf8(out).map_err(|e| Error::configuration(e.to_string()))
    }
}
