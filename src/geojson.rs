use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::ScrapeError;

pub const OUTPUT_FILE: &str = "bookcases.geojson";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// `[lon, lat]`
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Two-space indent, non-ASCII kept as-is, trailing newline.
    pub fn to_pretty_string(&self) -> serde_json::Result<String> {
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        Ok(body)
    }
}

/// Replace `dir` with a fresh directory holding only `bookcases.geojson`.
pub fn write_collection(dir: &Path, collection: &FeatureCollection) -> Result<PathBuf, ScrapeError> {
    let path = dir.join(OUTPUT_FILE);
    let body = collection
        .to_pretty_string()
        .map_err(|e| ScrapeError::fs(&path, e.into()))?;

    reset_dir(dir)?;
    fs::write(&path, body).map_err(|e| ScrapeError::fs(&path, e))?;
    info!("Wrote {} features to {}", collection.features.len(), path.display());
    Ok(path)
}

fn reset_dir(dir: &Path) -> Result<(), ScrapeError> {
    if !is_resettable(dir) {
        return Err(ScrapeError::Config(format!(
            "refusing to reset output directory {:?}",
            dir.display().to_string()
        )));
    }

    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| ScrapeError::fs(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| ScrapeError::fs(dir, e))
}

/// A directory may be wiped unless it names the filesystem root, the current
/// directory or one of its ancestors, or reaches anywhere through `..`.
fn is_resettable(dir: &Path) -> bool {
    let mut named = false;
    for c in dir.components() {
        match c {
            Component::ParentDir => return false,
            Component::Normal(_) => named = true,
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }
    if !named {
        return false;
    }

    // Symlinks can still point at the working directory or above it.
    let Ok(target) = dir.canonicalize() else {
        return true;
    };
    if target.parent().is_none() {
        return false;
    }
    match std::env::current_dir().and_then(|cwd| cwd.canonicalize()) {
        Ok(cwd) => !cwd.starts_with(&target),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> FeatureCollection {
        let props = json!({ "id": 4, "note": "Boîte à lire – église" });
        FeatureCollection {
            features: vec![Feature {
                geometry: Geometry::Point {
                    coordinates: [2.35, 48.85],
                },
                properties: props.as_object().unwrap().clone(),
            }],
        }
    }

    #[test]
    fn serialized_layout() {
        let body = sample().to_pretty_string().unwrap();
        let expected = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {
        "type": "Point",
        "coordinates": [
          2.35,
          48.85
        ]
      },
      "properties": {
        "id": 4,
        "note": "Boîte à lire – église"
      }
    }
  ]
}
"#;
        assert_eq!(body, expected);
    }

    #[test]
    fn reads_back() {
        let body = sample().to_pretty_string().unwrap();
        let parsed: FeatureCollection = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn replaces_previous_output() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("bookcases");
        fs::create_dir_all(dir.join("old")).unwrap();
        fs::write(dir.join("stale.txt"), "x").unwrap();

        let path = write_collection(&dir, &sample()).unwrap();
        assert_eq!(path, dir.join(OUTPUT_FILE));

        let entries: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, [OUTPUT_FILE]);
    }

    #[test]
    fn creates_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");
        write_collection(&dir, &FeatureCollection::default()).unwrap();
        let body = fs::read_to_string(dir.join(OUTPUT_FILE)).unwrap();
        assert_eq!(body, "{\n  \"type\": \"FeatureCollection\",\n  \"features\": []\n}\n");
    }

    #[test]
    fn refuses_to_wipe_cwd_or_root() {
        for dir in [".", "/", "", "..", "foo/..", "./out/../..", "out/../out"] {
            let err = write_collection(Path::new(dir), &FeatureCollection::default()).unwrap_err();
            assert!(matches!(err, ScrapeError::Config(_)), "{dir}");
        }
    }

    #[test]
    fn refuses_to_wipe_cwd_by_absolute_path() {
        let cwd = std::env::current_dir().unwrap();
        for dir in [cwd.clone(), cwd.parent().unwrap().to_path_buf()] {
            let err = write_collection(&dir, &FeatureCollection::default()).unwrap_err();
            assert!(matches!(err, ScrapeError::Config(_)), "{}", dir.display());
        }
        assert!(cwd.join("Cargo.toml").exists());
    }

    #[cfg(unix)]
    #[test]
    fn refuses_symlink_to_cwd() {
        let tmp = tempfile::tempdir().unwrap();
        let link = tmp.path().join("here");
        std::os::unix::fs::symlink(std::env::current_dir().unwrap(), &link).unwrap();
        let err = write_collection(&link, &FeatureCollection::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }
}
