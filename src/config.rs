use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pip::IndexConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Region feed (JSON array of fence documents)
    pub regions: PathBuf,
    /// Point of interest feed
    pub points: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let mut config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    /// Make relative feed paths relative to the config file's directory.
    fn resolve_paths(&mut self, base: &Path) {
        if self.data.regions.is_relative() {
            self.data.regions = base.join(&self.data.regions);
        }
        if self.data.points.is_relative() {
            self.data.points = base.join(&self.data.points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fenceline.toml");
        fs::write(
            &path,
            "[data]\nregions = \"fences.json\"\npoints = \"/srv/pois.json\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.data.regions, dir.path().join("fences.json"));
        assert_eq!(config.data.points, PathBuf::from("/srv/pois.json"));
        assert_eq!(config.index, IndexConfig::default());
    }

    #[test]
    fn test_load_index_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fenceline.toml");
        fs::write(
            &path,
            "[data]\nregions = \"a.json\"\npoints = \"b.json\"\n\n[index]\ncell_size = 0.25\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.index.cell_size, Some(0.25));
        assert_eq!(config.index.max_cells_per_region, 4096);
    }

    #[test]
    fn test_missing_data_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[index]\ncell_size = 1.0\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }
}
