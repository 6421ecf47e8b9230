//! File-based storage backend.
//!
//! Each key `namespace:id` is stored as `<storage_path>/<namespace>/<id>.json`.
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a half-written record.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tailor_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use tokio::fs;

const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";
const DEFAULT_STORAGE_PATH: &str = "./data/orders";

/// Persists records as JSON files under a base directory.
pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Maps a storage key to its file path, rejecting keys that would escape
	/// the base directory.
	fn record_path(&self, key: &str) -> Result<PathBuf, StorageError> {
		let (namespace, id) = key
			.split_once(':')
			.ok_or_else(|| StorageError::Backend(format!("Malformed storage key: {}", key)))?;
		for part in [namespace, id] {
			if part.is_empty() || part == "." || part == ".." || part.contains(['/', '\\']) {
				return Err(StorageError::Backend(format!(
					"Unsafe storage key: {}",
					key
				)));
			}
		}
		Ok(self
			.base_path
			.join(namespace)
			.join(format!("{}.{}", id, RECORD_EXTENSION)))
	}

	async fn read_namespace(&self, namespace: &str, out: &mut Vec<String>) -> Result<(), StorageError> {
		let dir = self.base_path.join(namespace);
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
				continue;
			}
			if let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) {
				out.push(format!("{}:{}", namespace, id));
			}
		}
		Ok(())
	}
}

async fn namespaces(base: &Path) -> Result<Vec<String>, StorageError> {
	let mut entries = match fs::read_dir(base).await {
		Ok(entries) => entries,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(e) => return Err(StorageError::Backend(e.to_string())),
	};

	let mut names = Vec::new();
	while let Some(entry) = entries
		.next_entry()
		.await
		.map_err(|e| StorageError::Backend(e.to_string()))?
	{
		let is_dir = entry
			.file_type()
			.await
			.map(|t| t.is_dir())
			.unwrap_or(false);
		if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
			names.push(name.to_string());
		}
	}
	Ok(names)
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.record_path(key)?;
		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.record_path(key)?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension(TEMP_EXTENSION);
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.record_path(key)?;
		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.record_path(key)?;
		fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut keys = Vec::new();
		match prefix.split_once(':') {
			Some((namespace, _)) => self.read_namespace(namespace, &mut keys).await?,
			None => {
				for namespace in namespaces(&self.base_path).await? {
					self.read_namespace(&namespace, &mut keys).await?;
				}
			},
		}
		keys.retain(|key| key.starts_with(prefix));
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("storage_path cannot be empty".to_string()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for records (default: "./data/orders")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);
	tracing::debug!(path = %storage_path, "Using file storage");

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
