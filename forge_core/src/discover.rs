use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use tracing::trace;

use crate::ForgeConfig;
use crate::ForgeError;
use crate::ForgeResult;

/// Template files end with this suffix unless configured otherwise.
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".tmpl.html";

/// Options for compiling a template folder.
///
/// Use [`BuildOptions::default()`] for the defaults or
/// [`BuildOptions::from_config`] to construct from a [`ForgeConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
	/// File name suffix that marks a template. Stripped from template names.
	pub suffix: String,
	/// Collapse whitespace between tags and trim each template.
	pub minify_html: bool,
	/// Gitignore-style patterns excluded from discovery.
	pub exclude_patterns: Vec<String>,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self {
			suffix: DEFAULT_TEMPLATE_SUFFIX.to_string(),
			minify_html: false,
			exclude_patterns: Vec::new(),
		}
	}
}

impl BuildOptions {
	pub fn from_config(config: Option<&ForgeConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};

		Self {
			suffix: config.templates.suffix.clone(),
			minify_html: config.templates.minify_html,
			exclude_patterns: config.templates.exclude.clone(),
		}
	}

	#[must_use]
	pub fn with_minify_html(mut self, minify_html: bool) -> Self {
		self.minify_html = minify_html;
		self
	}
}

/// A template file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
	/// Path relative to the template folder with `/` separators and without
	/// the suffix, e.g. `pages/home`.
	pub name: String,
	pub path: PathBuf,
}

/// Find every template under `root`, sorted by name.
pub fn discover_templates(root: &Path, options: &BuildOptions) -> ForgeResult<Vec<TemplateFile>> {
	if !root.is_dir() {
		return Err(ForgeError::TemplateFolderInvalid(
			root.display().to_string(),
		));
	}

	let exclude = build_exclude_matcher(root, &options.exclude_patterns)?;
	let mut paths = Vec::new();
	let mut ancestors = HashSet::new();
	walk_dir(root, &options.suffix, &exclude, &mut paths, &mut ancestors)?;

	let mut files: Vec<TemplateFile> = paths
		.into_iter()
		.filter_map(|path| {
			let name = template_name(root, &path, &options.suffix)?;
			Some(TemplateFile { name, path })
		})
		.collect();
	files.sort_by(|a, b| a.name.cmp(&b.name));

	Ok(files)
}

/// The template name of `path` below `root`.
pub fn template_name(root: &Path, path: &Path, suffix: &str) -> Option<String> {
	let relative = path.strip_prefix(root).ok()?;
	let joined = relative
		.components()
		.map(|component| component.as_os_str().to_str())
		.collect::<Option<Vec<_>>>()?
		.join("/");
	let name = joined.strip_suffix(suffix)?;

	(!name.is_empty() && !name.ends_with('/')).then(|| name.to_string())
}

/// Exclude patterns follow `.gitignore` syntax relative to the template
/// folder.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> ForgeResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			ForgeError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| ForgeError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

fn walk_dir(
	dir: &Path,
	suffix: &str,
	exclude: &Gitignore,
	files: &mut Vec<PathBuf>,
	ancestors: &mut HashSet<PathBuf>,
) -> ForgeResult<()> {
	// A cycle is a directory that is its own ancestor. Sibling symlinks to
	// one shared folder are walked once per link.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !ancestors.insert(canonical.clone()) {
		return Err(ForgeError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();
		let is_dir = path.is_dir();

		if exclude.matched(&path, is_dir).is_ignore() {
			trace!(path = %path.display(), "excluded");
			continue;
		}

		if is_dir {
			walk_dir(&path, suffix, exclude, files, ancestors)?;
		} else if path
			.file_name()
			.and_then(|name| name.to_str())
			.is_some_and(|name| name.ends_with(suffix))
		{
			files.push(path);
		}
	}

	ancestors.remove(&canonical);
	Ok(())
}
