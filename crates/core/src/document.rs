use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::value::{Table, Value, ValueKind};
use crate::DocumentError;

type Segments<'a> = SmallVec<[&'a str; 8]>;

/// Split a dotted key path (`flash.proxy.addr`) into segments.
/// The empty path has no segments and addresses nothing.
fn segments(path: &str) -> Segments<'_> {
    if path.is_empty() { return SmallVec::new(); }
    path.split('.').collect()
}

/// Hierarchical settings tree addressed by dotted key paths.
///
/// Cloning yields a fully independent copy; synthesis always works on a clone
/// of whatever the caller passed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    root: Table,
}

impl ConfigDocument {
    pub fn new() -> Self { Self::default() }

    /// Parse a document from an arbitrary JSON object.
    pub fn from_json(v: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(v)
    }

    pub fn is_empty(&self) -> bool { self.root.is_empty() }

    /// Value at `path`. An explicit `null` reads as absent.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segs = segments(path);
        let (last, parents) = segs.split_last()?;
        let mut table = &self.root;
        for seg in parents {
            match table.get(*seg)? {
                Value::Table(t) => table = t,
                _ => return None,
            }
        }
        table.get(*last).filter(|v| !v.is_null())
    }

    pub fn contains(&self, path: &str) -> bool { self.get(path).is_some() }

    pub fn get_str(&self, path: &str) -> Result<Option<&str>, DocumentError> {
        self.get(path).map(|v| v.as_str().map_err(|e| e.at(path))).transpose()
    }

    pub fn get_integer(&self, path: &str) -> Result<Option<i64>, DocumentError> {
        self.get(path).map(|v| v.as_integer().map_err(|e| e.at(path))).transpose()
    }

    pub fn get_bool(&self, path: &str) -> Result<Option<bool>, DocumentError> {
        self.get(path).map(|v| v.as_bool().map_err(|e| e.at(path))).transpose()
    }

    pub fn get_string_list(&self, path: &str) -> Result<Option<Vec<&str>>, DocumentError> {
        self.get(path).map(|v| v.as_string_list().map_err(|e| e.at(path))).transpose()
    }

    /// Walk (and create) the tables named by `parents`. A `null` segment becomes a
    /// table; any other non-table value fails.
    fn table_mut(&mut self, parents: &[&str]) -> Result<&mut Table, DocumentError> {
        let mut table = &mut self.root;
        for (depth, seg) in parents.iter().enumerate() {
            let entry = table.entry((*seg).to_string()).or_insert_with(|| Value::Table(Table::new()));
            if entry.is_null() {
                *entry = Value::Table(Table::new());
            }
            match entry {
                Value::Table(t) => table = t,
                other => {
                    return Err(DocumentError::TypeMismatch {
                        path: parents[..=depth].join("."),
                        expected: ValueKind::Table,
                        found: other.kind(),
                    })
                }
            }
        }
        Ok(table)
    }

    /// Unconditional write. Intermediate tables are created as needed.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), DocumentError> {
        let segs = segments(path);
        let Some((last, parents)) = segs.split_last() else { return Ok(()) };
        let table = self.table_mut(parents)?;
        table.insert((*last).to_string(), value.into());
        Ok(())
    }

    /// Write only when nothing is stored at `path`. Returns whether a write happened.
    pub fn set_if_absent(&mut self, path: &str, value: impl Into<Value>) -> Result<bool, DocumentError> {
        if path.is_empty() || self.contains(path) { return Ok(false); }
        self.set(path, value)?;
        Ok(true)
    }

    /// Remove and return the value at `path`; absent keys are not an error.
    pub fn delete(&mut self, path: &str) -> Option<Value> {
        let segs = segments(path);
        let (last, parents) = segs.split_last()?;
        let mut table = &mut self.root;
        for seg in parents {
            match table.get_mut(*seg)? {
                Value::Table(t) => table = t,
                _ => return None,
            }
        }
        table.remove(*last)
    }

    /// Dotted paths of every non-table, non-null value, in key order.
    pub fn leaf_paths(&self) -> Vec<String> {
        fn walk(table: &Table, base: &str, out: &mut Vec<String>) {
            for (k, v) in table.iter() {
                let path = if base.is_empty() { k.clone() } else { format!("{}.{}", base, k) };
                match v {
                    Value::Table(t) => walk(t, &path, out),
                    Value::Null => {}
                    _ => out.push(path),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, "", &mut out);
        out
    }
}
