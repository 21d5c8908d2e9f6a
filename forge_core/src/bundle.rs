use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::ForgeError;
use crate::ForgeResult;
use crate::template::CompiledTemplate;

/// Written at the top of every bundle so readers know the file is generated.
pub const BUNDLE_BANNER: &str = "Generated by forge-templates. Do not edit.";

/// Bumped whenever the layout of [`Bundle`] changes incompatibly.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// The single build artifact: every compiled template of a folder keyed by
/// template name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
	pub generator: String,
	pub format_version: u32,
	/// Whether literal chunks were minified at build time.
	#[serde(default)]
	pub minified: bool,
	pub templates: BTreeMap<String, CompiledTemplate>,
}

impl Bundle {
	pub fn new(minified: bool) -> Self {
		Self {
			generator: BUNDLE_BANNER.to_string(),
			format_version: BUNDLE_FORMAT_VERSION,
			minified,
			templates: BTreeMap::new(),
		}
	}

	pub fn to_json(&self) -> ForgeResult<String> {
		let mut json =
			serde_json::to_string_pretty(self).map_err(|e| ForgeError::Bundle(e.to_string()))?;
		json.push('\n');
		Ok(json)
	}

	pub fn from_json(content: &str) -> ForgeResult<Self> {
		let bundle: Self =
			serde_json::from_str(content).map_err(|e| ForgeError::Bundle(e.to_string()))?;

		if bundle.format_version != BUNDLE_FORMAT_VERSION {
			return Err(ForgeError::Bundle(format!(
				"unsupported format version {} (expected {BUNDLE_FORMAT_VERSION})",
				bundle.format_version
			)));
		}

		Ok(bundle)
	}

	/// Write the bundle, creating parent directories as needed.
	pub fn write(&self, path: &Path) -> ForgeResult<()> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)?;
		}

		std::fs::write(path, self.to_json()?)?;
		debug!(path = %path.display(), templates = self.templates.len(), "wrote bundle");
		Ok(())
	}

	pub fn read(path: &Path) -> ForgeResult<Self> {
		let content = std::fs::read_to_string(path)?;
		Self::from_json(&content)
	}

	pub fn len(&self) -> usize {
		self.templates.len()
	}

	pub fn is_empty(&self) -> bool {
		self.templates.is_empty()
	}
}
