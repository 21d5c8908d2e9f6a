use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// The role a missing template was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRole {
	/// The template passed to the render entry point.
	Template,
	/// The base template named by a child's `{{ extend name }}` directive.
	ExtendTarget,
}

impl fmt::Display for TemplateRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Template => f.write_str("HTML template"),
			Self::ExtendTarget => f.write_str("HTML template to extend from"),
		}
	}
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ForgeError {
	#[error(transparent)]
	#[diagnostic(code(forge::io_error))]
	Io(#[from] std::io::Error),

	#[error("no such {role}: `{name}`")]
	#[diagnostic(
		code(forge::template_not_found),
		help("template names are paths relative to the template folder without the suffix, e.g. `pages/home`")
	)]
	TemplateNotFound { name: String, role: TemplateRole },

	#[error("template folder is not a valid directory: `{0}`")]
	#[diagnostic(
		code(forge::template_folder_invalid),
		help("pass an existing directory or set `templates.root` in forge.toml")
	)]
	TemplateFolderInvalid(String),

	#[error("unterminated expression in template `{template}` at {line}:{column}: {message}")]
	#[diagnostic(
		code(forge::template_syntax),
		help("close the expression with a matching `}}` or escape a literal `${{` as `\\${{`")
	)]
	TemplateSyntax {
		template: String,
		line: usize,
		column: usize,
		message: String,
	},

	#[error("expression failed in template `{template}`: {message}")]
	#[diagnostic(code(forge::expression))]
	Expression { template: String, message: String },

	#[error("invalid template bundle: {0}")]
	#[diagnostic(
		code(forge::bundle),
		help("rebuild the bundle with `forge-templates build <folder> <file>`")
	)]
	Bundle(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(forge::config_parse),
		help("check that forge.toml is valid TOML with [templates] and/or [data] sections")
	)]
	ConfigParse(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(forge::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(forge::unsupported_format),
		help("supported formats: text, json, toml, yaml, yml")
	)]
	UnsupportedDataFormat(String),

	#[error("unconvertible float value in data file `{path}`: {value}")]
	#[diagnostic(
		code(forge::unconvertible_float),
		help("NaN and Infinity are not valid JSON numbers")
	)]
	UnconvertibleFloat { path: String, value: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(forge::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

impl ForgeError {
	/// The name of the template that could not be found, if this is a lookup
	/// failure.
	pub fn missing_template(&self) -> Option<&str> {
		match self {
			Self::TemplateNotFound { name, .. } => Some(name.as_str()),
			_ => None,
		}
	}
}

pub type ForgeResult<T> = Result<T, ForgeError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
