use std::fmt;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::directive::Directive;

/// Whether a segment came from the literal text of a template or from an
/// evaluated expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
	Static,
	Dynamic,
}

/// One unit of a template body.
///
/// The kind is fixed at construction. Only the value can change afterwards,
/// and only through marker zeroing or block substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	value: String,
	kind: SegmentKind,
}

impl Segment {
	pub fn new_static(value: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			kind: SegmentKind::Static,
		}
	}

	/// An evaluated segment. An absent value is stored as the empty string.
	pub fn new_dynamic<V: Into<String>>(value: Option<V>) -> Self {
		Self {
			value: value.map(Into::into).unwrap_or_default(),
			kind: SegmentKind::Dynamic,
		}
	}

	pub fn value(&self) -> &str {
		&self.value
	}

	pub fn kind(&self) -> SegmentKind {
		self.kind
	}

	pub fn is_static(&self) -> bool {
		self.kind == SegmentKind::Static
	}

	pub fn is_dynamic(&self) -> bool {
		self.kind == SegmentKind::Dynamic
	}

	/// Recognize a directive in this segment. Static segments never carry
	/// directives.
	pub fn directive(&self) -> Option<Directive<'_>> {
		if self.is_static() {
			return None;
		}

		Directive::recognize(&self.value)
	}

	/// Erase the value so nothing of this segment reaches the output.
	pub fn zero(&mut self) {
		self.value.clear();
	}

	pub(crate) fn replace(&mut self, value: impl Into<String>) {
		self.value = value.into();
	}
}

/// The ordered segments of one template instance.
///
/// Static and dynamic segments strictly alternate, starting and ending with a
/// static segment, so a sequence with `k` evaluated expressions always holds
/// `2k + 1` segments.
#[derive(Debug, Clone, PartialEq, Eq, Deref, DerefMut)]
#[deref(forward)]
#[deref_mut(forward)]
pub struct SegmentSequence(Vec<Segment>);

impl SegmentSequence {
	pub fn builder() -> SegmentSequenceBuilder {
		SegmentSequenceBuilder::default()
	}

	/// Interleave literal chunks with evaluated values the way a tagged
	/// template literal does: `literals[0]`, `values[0]`, `literals[1]`, ...
	///
	/// Missing literals are filled with empty static segments so the
	/// alternation always holds.
	pub fn from_parts<L, V, S>(literals: L, values: V) -> Self
	where
		L: IntoIterator,
		L::Item: Into<String>,
		V: IntoIterator<Item = Option<S>>,
		S: Into<String>,
	{
		let mut builder = Self::builder();
		let mut literals = literals.into_iter();
		let mut values = values.into_iter();

		loop {
			match (literals.next(), values.next()) {
				(Some(literal), Some(value)) => {
					builder = builder.literal(literal).value(value);
				}
				(Some(literal), None) => builder = builder.literal(literal),
				(None, Some(value)) => builder = builder.value(value),
				(None, None) => break,
			}
		}

		builder.build()
	}

	/// Number of evaluated segments.
	pub fn dynamic_count(&self) -> usize {
		self.0.iter().filter(|segment| segment.is_dynamic()).count()
	}

	/// Concatenate every segment value in order.
	pub fn flatten(&self) -> String {
		let capacity = self.0.iter().map(|segment| segment.value.len()).sum();
		let mut output = String::with_capacity(capacity);
		for segment in &self.0 {
			output.push_str(&segment.value);
		}
		output
	}
}

impl fmt::Display for SegmentSequence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for segment in &self.0 {
			f.write_str(&segment.value)?;
		}
		Ok(())
	}
}

/// Incrementally builds a [`SegmentSequence`] while keeping the static /
/// dynamic alternation intact.
#[derive(Debug, Default)]
pub struct SegmentSequenceBuilder {
	segments: Vec<Segment>,
}

impl SegmentSequenceBuilder {
	/// Append literal text. Consecutive literals are merged into one static
	/// segment.
	#[must_use]
	pub fn literal(mut self, text: impl Into<String>) -> Self {
		let text = text.into();
		match self.segments.last_mut() {
			Some(last) if last.is_static() => last.value.push_str(&text),
			_ => self.segments.push(Segment::new_static(text)),
		}
		self
	}

	/// Append an evaluated value, inserting an empty literal first when the
	/// previous segment is not static.
	#[must_use]
	pub fn value<V: Into<String>>(mut self, value: Option<V>) -> Self {
		if !self.segments.last().is_some_and(Segment::is_static) {
			self.segments.push(Segment::new_static(""));
		}
		self.segments.push(Segment::new_dynamic(value));
		self
	}

	pub fn build(mut self) -> SegmentSequence {
		if !self.segments.last().is_some_and(Segment::is_static) {
			self.segments.push(Segment::new_static(""));
		}
		SegmentSequence(self.segments)
	}
}
