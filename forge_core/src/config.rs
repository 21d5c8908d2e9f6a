use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::ForgeError;
use crate::ForgeResult;
use crate::discover::DEFAULT_TEMPLATE_SUFFIX;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["forge.toml", ".forge.toml", ".config/forge.toml"];

/// Data source entry for a `[data]` namespace.
///
/// Plain entries pick the format from the file extension:
///
/// ```toml
/// [data]
/// site = "site.json"
/// ```
///
/// Typed entries name the format explicitly:
///
/// ```toml
/// [data]
/// banner = { path = "BANNER", format = "text" }
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum DataSource {
	Path(PathBuf),
	Typed(TypedDataSource),
}

impl DataSource {
	pub fn path(&self) -> &Path {
		match self {
			Self::Path(path) => path.as_path(),
			Self::Typed(typed) => typed.path.as_path(),
		}
	}

	/// The explicit format override, if configured.
	pub fn format(&self) -> Option<&str> {
		match self {
			Self::Path(_) => None,
			Self::Typed(typed) => Some(typed.format.as_str()),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct TypedDataSource {
	pub path: PathBuf,
	pub format: String,
}

/// Configuration loaded from a `forge.toml` file.
///
/// ```toml
/// [templates]
/// root = "templates"
/// suffix = ".tmpl.html"
/// minify_html = true
/// exclude = ["drafts/"]
///
/// [data]
/// site = "site.json"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ForgeConfig {
	#[serde(default)]
	pub templates: TemplatesConfig,
	/// Namespace name to data file, relative to the project root.
	#[serde(default)]
	pub data: BTreeMap<String, DataSource>,
}

/// The `[templates]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TemplatesConfig {
	/// Template folder relative to the project root.
	#[serde(default = "default_root")]
	pub root: PathBuf,
	#[serde(default = "default_suffix")]
	pub suffix: String,
	#[serde(default)]
	pub minify_html: bool,
	/// Gitignore-style patterns excluded from discovery.
	#[serde(default)]
	pub exclude: Vec<String>,
}

impl Default for TemplatesConfig {
	fn default() -> Self {
		Self {
			root: default_root(),
			suffix: default_suffix(),
			minify_html: false,
			exclude: Vec::new(),
		}
	}
}

fn default_root() -> PathBuf {
	PathBuf::from("templates")
}

fn default_suffix() -> String {
	DEFAULT_TEMPLATE_SUFFIX.to_string()
}

impl ForgeConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> ForgeResult<Option<ForgeConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;
		let config: ForgeConfig =
			toml::from_str(&content).map_err(|e| ForgeError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// The template folder resolved against the project root.
	pub fn template_root(&self, root: &Path) -> PathBuf {
		root.join(&self.templates.root)
	}

	/// Read each data file into a JSON object keyed by namespace.
	pub fn load_data(&self, root: &Path) -> ForgeResult<serde_json::Map<String, serde_json::Value>> {
		let mut data = serde_json::Map::new();

		for (namespace, source) in &self.data {
			let rel_path = source.path();
			let value = read_data_file(&root.join(rel_path), source.format(), rel_path)?;
			data.insert(namespace.clone(), value);
		}

		Ok(data)
	}
}

/// Read a data file, picking the format from its extension.
pub fn load_data_file(path: &Path) -> ForgeResult<serde_json::Value> {
	read_data_file(path, None, path)
}

fn read_data_file(
	path: &Path,
	format: Option<&str>,
	display_path: &Path,
) -> ForgeResult<serde_json::Value> {
	let path_display = display_path.display().to_string();
	let content = std::fs::read_to_string(path).map_err(|e| {
		ForgeError::DataFile {
			path: path_display.clone(),
			reason: e.to_string(),
		}
	})?;
	let format = match format {
		Some(format) => format.trim().to_ascii_lowercase(),
		None => {
			path.extension()
				.and_then(|e| e.to_str())
				.unwrap_or("")
				.to_ascii_lowercase()
		}
	};

	parse_data_file(&content, &format, &path_display)
}

/// Parse a data file's content into a `serde_json::Value` based on its
/// format.
fn parse_data_file(
	content: &str,
	format: &str,
	path_display: &str,
) -> ForgeResult<serde_json::Value> {
	let data_error = |reason: String| {
		ForgeError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"text" | "txt" => Ok(serde_json::Value::String(content.to_string())),
		"json" => serde_json::from_str(content).map_err(|e| data_error(e.to_string())),
		"toml" => {
			let toml_value: toml::Value =
				toml::from_str(content).map_err(|e| data_error(e.to_string()))?;
			toml_to_json(toml_value, path_display)
		}
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| data_error(e.to_string())),
		other => Err(ForgeError::UnsupportedDataFormat(other.to_string())),
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value, path_display: &str) -> ForgeResult<serde_json::Value> {
	let json = match value {
		toml::Value::String(s) => serde_json::Value::String(s),
		toml::Value::Integer(i) => serde_json::Value::Number(i.into()),
		toml::Value::Float(f) => {
			serde_json::Value::Number(serde_json::Number::from_f64(f).ok_or_else(|| {
				ForgeError::UnconvertibleFloat {
					path: path_display.to_string(),
					value: f.to_string(),
				}
			})?)
		}
		toml::Value::Boolean(b) => serde_json::Value::Bool(b),
		toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: ForgeResult<Vec<serde_json::Value>> = arr
				.into_iter()
				.map(|v| toml_to_json(v, path_display))
				.collect();
			serde_json::Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = serde_json::Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v, path_display)?);
			}
			serde_json::Value::Object(map)
		}
	};

	Ok(json)
}
