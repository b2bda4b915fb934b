//! Hyperparameter Profile - named, versioned training knobs shared by every run

use crate::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A scalar hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperValue {
    /// `cos_lr: true`
    Bool(bool),
    /// `epochs: 300`
    Int(i64),
    /// `lr0: 0.01`
    Float(f64),
    /// `optimizer: AdamW`
    Text(String),
}

impl fmt::Display for HyperValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            // Debug keeps the decimal point on whole floats (3.0, not 3)
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for HyperValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for HyperValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for HyperValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for HyperValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for HyperValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Ordered name -> value pairs, as written in a YAML mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HyperparameterOverrides(pub Vec<(String, HyperValue)>);

impl<'de> Deserialize<'de> for HyperparameterOverrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OverridesVisitor;

        impl<'de> Visitor<'de> for OverridesVisitor {
            type Value = HyperparameterOverrides;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of hyperparameter name to scalar value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, HyperValue>()? {
                    entries.push((key, value));
                }
                Ok(HyperparameterOverrides(entries))
            }
        }

        deserializer.deserialize_map(OverridesVisitor)
    }
}

/// Immutable set of training knobs applied to every run in a session.
///
/// Presets are plain data; a session picks one by name and may layer
/// overrides on top with [`HyperparameterProfile::with_overrides`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HyperparameterProfile {
    name: String,
    version: u32,
    entries: Vec<(String, HyperValue)>,
}

impl HyperparameterProfile {
    /// Names accepted by [`HyperparameterProfile::preset`].
    pub const PRESETS: [&'static str; 2] = ["baseline-v1", "finetune-v1"];

    /// Create an empty profile.
    #[must_use]
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            entries: Vec::new(),
        }
    }

    /// Add or replace an entry, keeping the original position on replace.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<HyperValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Look up a named preset.
    ///
    /// - `baseline-v1`: 300-epoch schedule, auto optimizer, cosine LR and
    ///   heavy augmentation for small objects.
    /// - `finetune-v1`: 100 epochs, AdamW at a 10x lower LR with the first
    ///   10 backbone layers frozen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown name.
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "baseline-v1" => Ok(Self::new("baseline", 1)
                .set("device", 0)
                .set("workers", 4)
                .set("epochs", 300)
                .set("patience", 50)
                .set("batch", 16)
                .set("imgsz", 640)
                .set("optimizer", "auto")
                .set("seed", 42)
                .set("lr0", 0.01)
                .set("lrf", 0.01)
                .set("cos_lr", true)
                .set("momentum", 0.937)
                .set("weight_decay", 0.0005)
                .set("warmup_epochs", 3.0)
                .set("hsv_h", 0.015)
                .set("hsv_s", 0.7)
                .set("hsv_v", 0.4)
                .set("degrees", 10.0)
                .set("translate", 0.1)
                .set("scale", 0.8)
                .set("fliplr", 0.5)
                .set("mosaic", 1.0)
                .set("mixup", 0.15)
                .set("erasing", 0.4)
                .set("close_mosaic", 10)),
            "finetune-v1" => Ok(Self::new("finetune", 1)
                .set("device", "auto")
                .set("workers", 4)
                .set("epochs", 100)
                .set("patience", 20)
                .set("batch", 16)
                .set("imgsz", 640)
                .set("optimizer", "AdamW")
                .set("lr0", 0.001)
                .set("lrf", 0.01)
                .set("warmup_epochs", 3.0)
                .set("freeze", 10)
                .set("mosaic", 1.0)
                .set("mixup", 0.1)
                .set("close_mosaic", 10)
                .set("seed", 42)
                .set("exist_ok", true)),
            other => Err(Error::configuration(format!(
                "unknown hyperparameter preset {other:?} (available: {})",
                Self::PRESETS.join(", ")
            ))),
        }
    }

    /// Return a copy with `overrides` applied on top.
    #[must_use]
    pub fn with_overrides<I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, HyperValue)>,
    {
        overrides
            .into_iter()
            .fold(self.clone(), |profile, (key, value)| profile.set(key, value))
    }

    /// Profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Profile version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// `name-vN` label used in logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-v{}", self.name, self.version)
    }

    /// Get a value by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&HyperValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate entries in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HyperValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the profile has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON snapshot of the entries, for logs and dry-run output.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(serde_json::Value::Null)))
            .collect();
        serde_json::json!({
            "name": self.name,
            "version": self.version,
            "entries": serde_json::Value::Object(entries),
        })
    }
}
