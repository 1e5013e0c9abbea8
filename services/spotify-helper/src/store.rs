//! In-memory named results
//!
//! Each command reads from and writes to named slots so later commands in
//! the same chain can pick up earlier results. Nothing outlives the process.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct ResultStore {
    slots: BTreeMap<String, Vec<Value>>,
}

impl ResultStore {
    /// Store `items` under `name`, replacing any previous value.
    pub fn save(&mut self, name: &str, items: Vec<Value>) {
        info!(name, items = items.len(), "saving result");
        self.slots.insert(name.to_owned(), items);
    }

    pub fn get(&self, name: &str) -> Result<&[Value]> {
        self.slots
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownSlot(name.to_owned()))
    }

    /// JSON view of one slot, or of the whole store keyed by name.
    pub fn to_json(&self, name: Option<&str>) -> Result<Value> {
        match name {
            Some(name) => Ok(Value::Array(self.get(name)?.to_vec())),
            None => Ok(Value::Object(
                self.slots
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::Array(v.clone())))
                    .collect(),
            )),
        }
    }
}
