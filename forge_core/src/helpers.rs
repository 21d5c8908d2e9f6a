//! Small helpers that emulate loops, arbitrary logic and conditionals inside
//! expression-only template bodies.
//!
//! They are plain Rust functions usable from segment producers written in
//! Rust, and are also exposed to template expressions as `forEach`,
//! `execute` and `renderIf`.

use std::fmt::Display;
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// Apply `f` to every item in order and concatenate the results.
pub fn for_each<I, F, S>(items: I, f: F) -> String
where
	I: IntoIterator,
	F: FnMut(I::Item) -> S,
	S: Display,
{
	let mut output = String::new();
	for item in items.into_iter().map(f) {
		let _ = write!(output, "{item}");
	}
	output
}

/// Collects text emitted by the logic passed to [`execute`], in emission
/// order.
///
/// Clones share the same buffer, so a sink can be handed to callbacks that
/// must own what they capture.
#[derive(Debug, Clone, Default)]
pub struct EmitSink {
	buffer: Arc<Mutex<Vec<String>>>,
}

impl EmitSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append `text` to the output.
	pub fn emit(&self, text: impl Into<String>) {
		self.buffer
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(text.into());
	}

	/// Everything emitted so far joined in order.
	pub fn contents(&self) -> String {
		self.buffer
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.concat()
	}
}

/// What the logic passed to [`execute`] may return. Only text is appended to
/// the output; anything else is ignored.
pub trait ExecuteOutput {
	fn into_text(self) -> Option<String>;
}

impl ExecuteOutput for () {
	fn into_text(self) -> Option<String> {
		None
	}
}

impl ExecuteOutput for String {
	fn into_text(self) -> Option<String> {
		Some(self)
	}
}

impl ExecuteOutput for &str {
	fn into_text(self) -> Option<String> {
		Some(self.to_string())
	}
}

impl<T: ExecuteOutput> ExecuteOutput for Option<T> {
	fn into_text(self) -> Option<String> {
		self.and_then(ExecuteOutput::into_text)
	}
}

impl ExecuteOutput for minijinja::Value {
	fn into_text(self) -> Option<String> {
		self.as_str().map(str::to_string)
	}
}

/// Run `f` with an [`EmitSink`] and return everything it emitted, followed
/// by its own return value when that is text.
///
/// ```rust
/// use forge_core::execute;
///
/// let html = execute(|out| {
/// 	for n in 1..=3 {
/// 		out.emit(format!("<li>{n}</li>"));
/// 	}
/// 	"</ul>"
/// });
///
/// assert_eq!(html, "<li>1</li><li>2</li><li>3</li></ul>");
/// ```
pub fn execute<F, R>(f: F) -> String
where
	F: FnOnce(&EmitSink) -> R,
	R: ExecuteOutput,
{
	let sink = EmitSink::new();
	let returned = f(&sink);
	if let Some(text) = returned.into_text() {
		sink.emit(text);
	}
	sink.contents()
}

/// JavaScript-like truthiness: `false`, zero, the empty string, `NaN` and
/// absent values are falsy, everything else is truthy.
pub trait Truthy {
	fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
	fn is_truthy(&self) -> bool {
		*self
	}
}

impl Truthy for str {
	fn is_truthy(&self) -> bool {
		!self.is_empty()
	}
}

impl Truthy for String {
	fn is_truthy(&self) -> bool {
		!self.is_empty()
	}
}

impl<T: Truthy + ?Sized> Truthy for &T {
	fn is_truthy(&self) -> bool {
		(**self).is_truthy()
	}
}

impl<T: Truthy> Truthy for Option<T> {
	fn is_truthy(&self) -> bool {
		self.as_ref().is_some_and(Truthy::is_truthy)
	}
}

impl<T> Truthy for Vec<T> {
	/// Collections are objects and therefore always truthy.
	fn is_truthy(&self) -> bool {
		true
	}
}

macro_rules! impl_truthy_for_integers {
	($($ty:ty),*) => {
		$(
			impl Truthy for $ty {
				fn is_truthy(&self) -> bool {
					*self != 0
				}
			}
		)*
	};
}

impl_truthy_for_integers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Truthy for f32 {
	fn is_truthy(&self) -> bool {
		*self != 0.0 && !self.is_nan()
	}
}

impl Truthy for f64 {
	fn is_truthy(&self) -> bool {
		*self != 0.0 && !self.is_nan()
	}
}

impl Truthy for serde_json::Value {
	fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(b) => *b,
			Self::Number(n) => n.as_f64().is_some_and(|n| n.is_truthy()),
			Self::String(s) => !s.is_empty(),
			Self::Array(_) | Self::Object(_) => true,
		}
	}
}

impl Truthy for minijinja::Value {
	fn is_truthy(&self) -> bool {
		use minijinja::value::ValueKind;

		match self.kind() {
			ValueKind::Undefined | ValueKind::None => false,
			ValueKind::Seq | ValueKind::Map => true,
			_ => self.is_true(),
		}
	}
}

/// `a` when `cond` is truthy, otherwise `b`.
pub fn render_if<C, T>(cond: C, a: T, b: T) -> T
where
	C: Truthy,
{
	if cond.is_truthy() { a } else { b }
}

/// `text` when `cond` is truthy, otherwise the empty string.
pub fn render_if_or_empty<C>(cond: C, text: impl Into<String>) -> String
where
	C: Truthy,
{
	if cond.is_truthy() {
		text.into()
	} else {
		String::new()
	}
}
