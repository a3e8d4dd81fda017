//! Loading of configuration files and their includes.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads `path` and every file it includes into one validated [`Config`].
pub(crate) async fn load(path: &Path) -> Result<Config, ConfigError> {
	let mut sections = SectionTable::default();
	let mut pending = vec![path.to_path_buf()];

	while let Some(file) = pending.pop() {
		let base_dir = file
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_else(|| PathBuf::from("."));
		let mut table = sections.read(&file).await?;

		for include in take_includes(&mut table)? {
			pending.push(if include.is_absolute() {
				include
			} else {
				base_dir.join(include)
			});
		}
		sections.merge(table, &file)?;
	}

	// Variables were resolved per file, so the values are taken as they are.
	let config: Config = toml::Value::Table(sections.combined).try_into()?;
	config.validate()?;
	Ok(config)
}

#[derive(Default)]
struct SectionTable {
	combined: toml::map::Map<String, toml::Value>,
	/// File each top-level section came from.
	sources: HashMap<String, PathBuf>,
	/// Canonical paths already read, to stop include cycles.
	visited: HashSet<PathBuf>,
}

impl SectionTable {
	async fn read(&mut self, path: &Path) -> Result<toml::map::Map<String, toml::Value>, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;
		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(&canonical).await?;
		let resolved = resolve_env_vars(&content)?;
		Ok(toml::from_str(&resolved)?)
	}

	fn merge(
		&mut self,
		table: toml::map::Map<String, toml::Value>,
		source: &Path,
	) -> Result<(), ConfigError> {
		for (key, value) in table {
			if let Some(existing) = self.sources.get(&key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}",
					key,
					existing.display(),
					source.display()
				)));
			}
			self.sources.insert(key.clone(), source.to_path_buf());
			self.combined.insert(key, value);
		}
		Ok(())
	}
}

fn take_includes(
	table: &mut toml::map::Map<String, toml::Value>,
) -> Result<Vec<PathBuf>, ConfigError> {
	match table.remove("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
