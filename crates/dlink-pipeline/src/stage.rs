//! Pipeline stages and the compiled document

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key every stage carries its plugin identifier under
pub const PLUGIN_KEY: &str = "plugin_name";

/// An ordered key/value stage document.
///
/// Keys keep insertion order; setting an existing key replaces its value in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(IndexMap<String, Value>);

impl Stage {
    pub fn new(plugin: impl Into<String>) -> Self {
        let mut stage = Self::default();
        stage.set(PLUGIN_KEY, plugin.into());
        stage
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Copy string properties in, keeping their order
    pub fn extend_props<'a>(&mut self, props: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (key, value) in props {
            self.0.insert(key.clone(), Value::String(value.clone()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn plugin(&self) -> Option<&str> {
        self.get_str(PLUGIN_KEY)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Execution mode of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobMode {
    #[default]
    Batch,
    Streaming,
}

/// The `env` section of a pipeline document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEnv {
    #[serde(rename = "job.mode")]
    pub mode: JobMode,
    #[serde(rename = "job.name")]
    pub name: String,
}

/// A compiled pipeline, serialized with sections in `env`, `source`,
/// `transform`, `sink` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    pub env: JobEnv,
    pub source: Vec<Stage>,
    #[serde(default)]
    pub transform: Vec<Stage>,
    pub sink: Vec<Stage>,
}

impl PipelineDocument {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn stage_count(&self) -> usize {
        self.source.len() + self.transform.len() + self.sink.len()
    }
}
