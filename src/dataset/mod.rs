//! Dataset descriptor (`data.yaml`) and sample loading
//!
//! The descriptor follows the common YOLO layout:
//!
//! ```yaml
//! path: datasets/vehicles   # root, relative to this file unless absolute
//! train: images/train       # relative to `path` unless absolute
//! val: images/val
//! names: [car, truck, bus]  # or {0: car, 1: truck, 2: bus}
//! ```

pub mod sample;

pub use sample::{derive_label_path, Sample, SampleLoader, IMAGE_EXTENSIONS, LABEL_EXTENSION};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Class names as written in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassNames {
    /// `names: [car, truck]`
    List(Vec<String>),
    /// `names: {0: car, 1: truck}`
    Indexed(BTreeMap<u32, String>),
}

impl Default for ClassNames {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl ClassNames {
    /// Look up the name for a class id.
    #[must_use]
    pub fn get(&self, class_id: u32) -> Option<&str> {
        match self {
            Self::List(names) => names.get(class_id as usize).map(String::as_str),
            Self::Indexed(names) => names.get(&class_id).map(String::as_str),
        }
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(names) => names.len(),
            Self::Indexed(names) => names.len(),
        }
    }

    /// True if no class names are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    path: Option<PathBuf>,
    train: PathBuf,
    #[serde(default)]
    val: Option<PathBuf>,
    #[serde(default)]
    names: ClassNames,
}

/// Resolved pointer to a dataset on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    source: PathBuf,
    root: PathBuf,
    train: PathBuf,
    val: Option<PathBuf>,
    names: ClassNames,
}

impl DatasetDescriptor {
    /// Load and resolve a descriptor file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file is missing, unreadable,
    /// or not a valid descriptor.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "cannot read dataset descriptor {}: {e}",
                path.display()
            ))
        })?;
        let raw: RawDescriptor = serde_yaml::from_str(&contents).map_err(|e| {
            Error::configuration(format!(
                "invalid dataset descriptor {}: {e}",
                path.display()
            ))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::resolve(path.to_path_buf(), base, raw))
    }

    fn resolve(source: PathBuf, base: &Path, raw: RawDescriptor) -> Self {
        let root = match raw.path {
            Some(root) if root.is_absolute() => root,
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        };
        let under_root = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };

        Self {
            train: under_root(raw.train),
            val: raw.val.map(under_root),
            source,
            root,
            names: raw.names,
        }
    }

    /// Descriptor file this was loaded from; handed to the trainer as-is.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Dataset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Training image directory.
    #[must_use]
    pub fn train_dir(&self) -> &Path {
        &self.train
    }

    /// Validation image directory, if declared.
    #[must_use]
    pub fn val_dir(&self) -> Option<&Path> {
        self.val.as_deref()
    }

    /// Declared class names.
    #[must_use]
    pub const fn class_names(&self) -> &ClassNames {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str, base: &str) -> DatasetDescriptor {
        let raw: RawDescriptor = serde_yaml::from_str(yaml).unwrap();
        DatasetDescriptor::resolve(PathBuf::from("data.yaml"), Path::new(base), raw)
    }

    #[test]
    fn test_relative_paths_join_root() {
        let d = parse("path: ds\ntrain: images/train\nval: images/val\nnames: [car]\n", "/cfg");
        assert_eq!(d.root(), Path::new("/cfg/ds"));
        assert_eq!(d.train_dir(), Path::new("/cfg/ds/images/train"));
        assert_eq!(d.val_dir(), Some(Path::new("/cfg/ds/images/val")));
    }

    #[test]
    fn test_absolute_train_dir_wins() {
        let d = parse("path: /data/ds\ntrain: /elsewhere/images\n", "/cfg");
        assert_eq!(d.train_dir(), Path::new("/elsewhere/images"));
        assert!(d.val_dir().is_none());
    }

    #[test]
    fn test_indexed_class_names() {
        let d = parse("train: images\nnames:\n  0: car\n  1: truck\n", "/cfg");
        assert_eq!(d.class_names().get(1), Some("truck"));
        assert_eq!(d.class_names().len(), 2);
        assert_eq!(d.class_names().get(5), None);
    }

    #[test]
    fn test_missing_descriptor_is_configuration_error() {
        let err = DatasetDescriptor::load("/definitely/not/here/data.yaml").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
