//! Saved list of city names and the currently selected one.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::project_dirs;

/// Supplies the city a refresh cycle should fetch.
pub trait CityListProvider {
    /// Re-synchronize the in-memory list from persistent storage.
    fn reload(&mut self) -> Result<()>;

    fn current_city_name(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct CityFile {
    cities: Vec<String>,
    current: Option<String>,
}

/// City list persisted as TOML.
#[derive(Debug, Clone)]
pub struct CityList {
    path: PathBuf,
    state: CityFile,
}

impl CityList {
    /// Load the list from the platform data directory.
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path()?)
    }

    /// Load the list stored at `path`; a missing file is an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = read_state(&path)?;
        Ok(Self { path, state })
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("cities.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cities(&self) -> &[String] {
        &self.state.cities
    }

    pub fn is_empty(&self) -> bool {
        self.state.cities.is_empty()
    }

    /// Add a city. The first city added becomes the current one.
    ///
    /// Returns `false` if the city was already saved.
    pub fn add(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            bail!("City name must not be empty");
        }
        if self.contains(name) {
            return Ok(false);
        }

        self.state.cities.push(name.to_string());
        if self.state.current.is_none() {
            self.state.current = Some(name.to_string());
        }
        Ok(true)
    }

    /// Remove a city; if it was current, the first remaining city takes over.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        let idx = self
            .state
            .cities
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| anyhow!("City '{name}' is not in the saved list"))?;

        self.state.cities.remove(idx);
        if self.state.current.as_deref() == Some(name) {
            self.state.current = self.state.cities.first().cloned();
        }
        Ok(())
    }

    pub fn select(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if !self.contains(name) {
            bail!("City '{name}' is not in the saved list.\nHint: run `forecast city add {name}` first.");
        }
        self.state.current = Some(name.to_string());
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create city list directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(&self.state).context("Failed to serialize city list")?;
        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write city list: {}", self.path.display()))?;

        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        self.state.cities.iter().any(|c| c == name)
    }
}

impl CityListProvider for CityList {
    fn reload(&mut self) -> Result<()> {
        self.state = read_state(&self.path)?;
        Ok(())
    }

    /// Selected city if still saved, else the first saved city.
    fn current_city_name(&self) -> Option<&str> {
        self.state
            .current
            .as_deref()
            .filter(|name| !name.is_empty() && self.contains(name))
            .or_else(|| self.state.cities.iter().map(String::as_str).find(|name| !name.is_empty()))
    }
}

fn read_state(path: &Path) -> Result<CityFile> {
    if !path.exists() {
        return Ok(CityFile::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read city list: {}", path.display()))?;

    let state: CityFile = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse city list: {}", path.display()))?;

    Ok(state.normalized())
}

impl CityFile {
    /// Trim hand-edited entries and drop blank ones.
    fn normalized(self) -> Self {
        let cities = self
            .cities
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        let current = self.current.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        Self { cities, current }
    }
}
