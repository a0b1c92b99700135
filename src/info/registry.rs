//! Registered capabilities.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Names this proxy advertises in `/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    names: BTreeSet<String>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise `name`. Registering twice is harmless.
    pub fn register(&mut self, name: impl Into<String>) {
        let name = name.into();
        tracing::info!(capability = %name, "Registered capability");
        self.names.insert(name);
    }

    /// Add every registered name to `doc` as an empty object, leaving
    /// existing entries alone.
    pub fn merge_into(&self, doc: &mut Map<String, Value>) {
        for name in &self.names {
            doc.entry(name.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }
}
