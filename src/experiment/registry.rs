//! Model Registry - ordered display name -> weight reference mapping

use crate::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One model queued for benchmarking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    display_name: String,
    weight_reference: String,
}

impl ModelSpec {
    /// Create a model spec.
    #[must_use]
    pub fn new(display_name: impl Into<String>, weight_reference: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            weight_reference: weight_reference.into(),
        }
    }

    /// Unique name used for the run and the result row.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Weight file or hub identifier handed to the trainer.
    #[must_use]
    pub fn weight_reference(&self) -> &str {
        &self.weight_reference
    }
}

/// Models in the order they were queued.
///
/// Keyed by display name, so dropping one entry leaves the relative order of
/// the rest untouched.
///
/// ```rust
/// use detbench::experiment::ModelRegistry;
///
/// let mut registry = ModelRegistry::new();
/// registry.insert("YOLOv8n", "yolov8n.pt")?;
/// registry.insert("YOLOv9t", "yolov9t.pt")?;
/// registry.insert("YOLOv11n", "yolo11n.pt")?;
/// registry.remove("YOLOv9t");
///
/// let names: Vec<&str> = registry.iter().map(|m| m.display_name()).collect();
/// assert_eq!(names, ["YOLOv8n", "YOLOv11n"]);
/// # Ok::<(), detbench::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the display name is already taken.
    pub fn insert(
        &mut self,
        display_name: impl Into<String>,
        weight_reference: impl Into<String>,
    ) -> Result<()> {
        let spec = ModelSpec::new(display_name, weight_reference);
        if self.get(spec.display_name()).is_some() {
            return Err(Error::configuration(format!(
                "duplicate model name {:?} in registry",
                spec.display_name()
            )));
        }
        self.models.push(spec);
        Ok(())
    }

    /// Remove a model by name, returning it if present.
    pub fn remove(&mut self, display_name: &str) -> Option<ModelSpec> {
        let idx = self
            .models
            .iter()
            .position(|m| m.display_name() == display_name)?;
        Some(self.models.remove(idx))
    }

    /// Look up a model by name.
    #[must_use]
    pub fn get(&self, display_name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.display_name() == display_name)
    }

    /// Iterate in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ModelSpec> {
        self.models.iter()
    }

    /// Number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True if no model is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<'a> IntoIterator for &'a ModelRegistry {
    type Item = &'a ModelSpec;
    type IntoIter = std::slice::Iter<'a, ModelSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for ModelRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = ModelRegistry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of model display name to weight reference")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut registry = ModelRegistry::new();
                while let Some((name, weights)) = map.next_entry::<String, String>()? {
                    registry.insert(name, weights).map_err(de::Error::custom)?;
                }
                Ok(registry)
            }
        }

        deserializer.deserialize_map(RegistryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut registry = ModelRegistry::new();
        registry.insert("YOLOv8n", "yolov8n.pt").unwrap();
        let err = registry.insert("YOLOv8n", "other.pt").unwrap_err();
        assert!(err.to_string().contains("duplicate model name"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("YOLOv8n").unwrap().weight_reference(), "yolov8n.pt");
    }

    #[test]
    fn test_remove_missing_is_none() {
        let mut registry = ModelRegistry::new();
        assert!(registry.remove("nope").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let yaml = "YOLOv8s: yolov8s.pt\nYOLOv5n: yolov5n.pt\nYOLOv11n: yolo11n.pt\n";
        let registry: ModelRegistry = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = registry.iter().map(ModelSpec::display_name).collect();
        assert_eq!(names, ["YOLOv8s", "YOLOv5n", "YOLOv11n"]);
    }
}
