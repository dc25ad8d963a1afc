use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "sprout").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("sprout.db");

        Ok(Config { db_path, data_dir })
    }

    /// The user name saved by `sprout user set`, if any.
    pub fn current_user(&self) -> Result<Option<String>> {
        let path = self.data_dir.join("current_user");
        if !path.exists() {
            return Ok(None);
        }
        let name = std::fs::read_to_string(&path).context("Failed to read current user file")?;
        let name = name.trim().to_string();
        if name.is_empty() {
            Ok(None)
        } else {
            Ok(Some(name))
        }
    }

    pub fn set_current_user(&self, name: &str) -> Result<()> {
        let path = self.data_dir.join("current_user");
        std::fs::write(&path, name).context("Failed to write current user file")?;
        Ok(())
    }
}
