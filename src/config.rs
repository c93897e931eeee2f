use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{attributes::DEFAULT_ID_FIELD, io::{read_json, IdSource}, overlap::SNAP_TOLERANCE};

/// Pipeline constants. Every field has a default, so a settings file only
/// needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Overlap fractions within this distance of 0 or 1 are snapped.
    pub snap_tolerance: f64,
    /// Where cell ids live in the source partition.
    pub source_ids: IdSource,
    /// Where block ids live in the target partition.
    pub target_ids: IdSource,
    /// Attribute key holding the block identifier.
    pub block_id_field: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snap_tolerance: SNAP_TOLERANCE,
            source_ids: IdSource::Property("cellId".into()),
            target_ids: IdSource::DescriptionCode(DEFAULT_ID_FIELD.into()),
            block_id_field: DEFAULT_ID_FIELD.into(),
        }
    }
}

impl Settings {
    /// Defaults, overridden by the JSON file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Ok(Self::default()) };
        let settings: Settings = read_json(path)
            .with_context(|| format!("[config] Failed to load settings from {}", path.display()))?;
        anyhow::ensure!((0.0..0.5).contains(&settings.snap_tolerance),
            "[config] snap_tolerance must be in [0, 0.5), got {}", settings.snap_tolerance);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"snap_tolerance": 0.001, "source_ids": {"from": "property", "key": "id"}}"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.snap_tolerance, 0.001);
        assert_eq!(settings.source_ids, IdSource::Property("id".into()));
        assert_eq!(settings.block_id_field, "SEZ2011");
    }

    #[test]
    fn unknown_keys_and_bad_tolerances_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{"snap": 0.1}"#).unwrap();
        assert!(Settings::load(Some(&path)).is_err());

        std::fs::write(&path, r#"{"snap_tolerance": 0.7}"#).unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }
}
