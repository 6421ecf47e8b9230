//! Multi-file configuration loading.
//!
//! A configuration file may pull in sibling files with an `include` key,
//! either a single path or an array of paths. Included files may include
//! further files. Every top-level section must be defined exactly once
//! across the whole include tree, so the merged result never depends on
//! file ordering.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const INCLUDE_KEY: &str = "include";

/// Loads a root configuration file and its includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_dir: PathBuf,
	/// Canonical paths of files already read; guards against include cycles.
	visited: HashSet<PathBuf>,
	/// Section name to the file that defined it.
	origins: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_dir: impl AsRef<Path>) -> Self {
		Self {
			base_dir: base_dir.as_ref().to_path_buf(),
			visited: HashSet::new(),
			origins: HashMap::new(),
		}
	}

	/// Loads, merges and validates the configuration rooted at `path`.
	pub async fn load_config(&mut self, path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let root = self.locate(path.as_ref())?;
		let mut merged = toml::Table::new();
		self.merge_file(&root, &mut merged).await?;

		let rendered = toml::to_string(&merged)
			.map_err(|e| ConfigError::Parse(format!("Failed to serialize merged config: {}", e)))?;
		rendered.parse()
	}

	/// Reads one file into `merged`, then recurses into its includes.
	async fn merge_file(&mut self, path: &Path, merged: &mut toml::Table) -> Result<(), ConfigError> {
		let mut table = self.read_table(path).await?;
		let includes = match table.remove(INCLUDE_KEY) {
			Some(value) => parse_includes(&value)?,
			None => Vec::new(),
		};

		for (section, value) in table {
			if let Some(previous) = self.origins.get(&section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					section,
					previous.display(),
					path.display()
				)));
			}
			self.origins.insert(section.clone(), path.to_path_buf());
			merged.insert(section, value);
		}

		for include in includes {
			let included = self.locate(&include)?;
			Box::pin(self.merge_file(&included, merged)).await?;
		}

		Ok(())
	}

	async fn read_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;
		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let raw = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&raw)?;
		Ok(toml::from_str(&resolved)?)
	}

	fn locate(&self, path: &Path) -> Result<PathBuf, ConfigError> {
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_dir.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}

fn parse_includes(value: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
		toml::Value::Array(items) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		_ => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
