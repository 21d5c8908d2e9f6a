//! Recognition of the three composition markers that may occupy a whole
//! expression slot: `{{ name }}`, `{{ end }}` and `{{ extend base }}`.

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const END_KEYWORD: &str = "end";
const EXTEND_KEYWORD: &str = "extend";

/// A composition marker found in the value of a dynamic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
	/// `{{ name }}` opens the block `name`.
	BlockStart(&'a str),
	/// `{{ end }}` closes the open block.
	BlockEnd,
	/// `{{ extend base }}` declares the template a child of `base`.
	Extend(&'a str),
}

impl<'a> Directive<'a> {
	/// Match the whole (trimmed) value against the directive syntax. Text
	/// around the delimiters or anything other than bare identifiers inside
	/// them means the value is ordinary content.
	pub fn recognize(value: &'a str) -> Option<Self> {
		let inner = value
			.trim()
			.strip_prefix(OPEN)?
			.strip_suffix(CLOSE)?
			.trim();

		if inner == END_KEYWORD {
			return Some(Self::BlockEnd);
		}

		if is_identifier(inner) {
			return (inner != EXTEND_KEYWORD).then_some(Self::BlockStart(inner));
		}

		let rest = inner.strip_prefix(EXTEND_KEYWORD)?;
		let name = rest.trim_start();
		// `extend` must be followed by at least one whitespace character.
		if name.len() == rest.len() || !is_identifier(name) {
			return None;
		}

		Some(Self::Extend(name))
	}

	/// The block name when this is a block start.
	pub fn block_name(&self) -> Option<&'a str> {
		match self {
			Self::BlockStart(name) => Some(name),
			_ => None,
		}
	}

	/// The base template name when this is an extend directive.
	pub fn extend_target(&self) -> Option<&'a str> {
		match self {
			Self::Extend(name) => Some(name),
			_ => None,
		}
	}

	/// Block starts and block ends, the markers zeroed when a template is
	/// flattened without inheritance.
	pub fn is_block_marker(&self) -> bool {
		matches!(self, Self::BlockStart(_) | Self::BlockEnd)
	}
}

/// Whether `value` is `{{ name }}` for some block name.
pub fn is_block_start(value: &str) -> bool {
	matches!(Directive::recognize(value), Some(Directive::BlockStart(_)))
}

/// Whether `value` is `{{ end }}`.
pub fn is_block_end(value: &str) -> bool {
	matches!(Directive::recognize(value), Some(Directive::BlockEnd))
}

/// The base template named by `value` when it is `{{ extend base }}`.
pub fn extend_target(value: &str) -> Option<&str> {
	Directive::recognize(value).and_then(|directive| directive.extend_target())
}

/// A bare identifier made of word characters only.
pub fn is_identifier(value: &str) -> bool {
	!value.is_empty()
		&& value
			.bytes()
			.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}
