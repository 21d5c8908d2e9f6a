use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::ForgeError;
use crate::ForgeResult;
use crate::TemplateRole;
use crate::blocks::extract_blocks;
use crate::blocks::replace_blocks;
use crate::blocks::strip_block_markers;
use crate::segment::SegmentSequence;

/// Produces the segment sequence of one template for the given data.
pub trait SegmentProducer<D: ?Sized>: Send + Sync {
	fn produce(&self, data: &D) -> ForgeResult<SegmentSequence>;
}

impl<D, F> SegmentProducer<D> for F
where
	D: ?Sized,
	F: Fn(&D) -> SegmentSequence + Send + Sync,
{
	fn produce(&self, data: &D) -> ForgeResult<SegmentSequence> {
		Ok(self(data))
	}
}

/// Resolves template names to segment producers.
///
/// The renderer only ever reads through this trait. How the mapping is
/// populated (in memory, from a folder, from a bundle) is up to the
/// implementor.
pub trait TemplateRegistry<D: ?Sized> {
	fn resolve(&self, name: &str) -> Option<&dyn SegmentProducer<D>>;

	fn contains(&self, name: &str) -> bool {
		self.resolve(name).is_some()
	}
}

/// An in-memory registry of segment producers keyed by template name.
pub struct Registry<D: ?Sized> {
	producers: BTreeMap<String, Box<dyn SegmentProducer<D>>>,
}

impl<D: ?Sized> Default for Registry<D> {
	fn default() -> Self {
		Self {
			producers: BTreeMap::new(),
		}
	}
}

impl<D: ?Sized> fmt::Debug for Registry<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("templates", &self.producers.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl<D: ?Sized> Registry<D> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a producer under `name`, replacing any previous one.
	pub fn insert(
		&mut self,
		name: impl Into<String>,
		producer: impl SegmentProducer<D> + 'static,
	) -> &mut Self {
		self.producers.insert(name.into(), Box::new(producer));
		self
	}

	#[must_use]
	pub fn with(
		mut self,
		name: impl Into<String>,
		producer: impl SegmentProducer<D> + 'static,
	) -> Self {
		self.insert(name, producer);
		self
	}

	/// Registered template names in sorted order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.producers.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.producers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.producers.is_empty()
	}
}

impl<D: ?Sized> TemplateRegistry<D> for Registry<D> {
	fn resolve(&self, name: &str) -> Option<&dyn SegmentProducer<D>> {
		self.producers.get(name).map(AsRef::as_ref)
	}
}

/// The stages a single render call moves through.
#[derive(Debug)]
enum RenderState {
	Start,
	DirectiveScan(SegmentSequence),
	Flatten(SegmentSequence),
	ExtendResolve {
		child: SegmentSequence,
		base: String,
	},
	Done(String),
}

impl RenderState {
	fn label(&self) -> &'static str {
		match self {
			Self::Start => "start",
			Self::DirectiveScan(_) => "directive_scan",
			Self::Flatten(_) => "flatten",
			Self::ExtendResolve { .. } => "extend_resolve",
			Self::Done(_) => "done",
		}
	}
}

fn lookup<'r, D, R>(
	registry: &'r R,
	name: &str,
	role: TemplateRole,
) -> ForgeResult<&'r dyn SegmentProducer<D>>
where
	D: ?Sized,
	R: TemplateRegistry<D> + ?Sized,
{
	registry
		.resolve(name)
		.ok_or_else(|| ForgeError::TemplateNotFound {
			name: name.to_string(),
			role,
		})
}

/// The base template named by the first extend directive, if any.
fn find_extend_target(sequence: &SegmentSequence) -> Option<String> {
	sequence
		.iter()
		.find_map(|segment| segment.directive().and_then(|d| d.extend_target()))
		.map(str::to_string)
}

/// Render `name` with `data` against `registry`.
///
/// Templates without an `{{ extend base }}` directive are flattened with
/// their block markers removed. A template that extends a base contributes
/// only its blocks: the base is produced with the same data, the child's
/// blocks are substituted into it, and the base's output is returned. Only a
/// single level of inheritance is resolved.
#[instrument(level = "debug", skip(registry, data))]
pub fn render_template<D, R>(registry: &R, name: &str, data: &D) -> ForgeResult<String>
where
	D: ?Sized,
	R: TemplateRegistry<D> + ?Sized,
{
	let mut state = RenderState::Start;

	loop {
		state = match state {
			RenderState::Start => {
				let producer = lookup(registry, name, TemplateRole::Template)?;
				RenderState::DirectiveScan(producer.produce(data)?)
			}
			RenderState::DirectiveScan(sequence) => {
				match find_extend_target(&sequence) {
					Some(base) => {
						RenderState::ExtendResolve {
							child: sequence,
							base,
						}
					}
					None => RenderState::Flatten(sequence),
				}
			}
			RenderState::Flatten(mut sequence) => {
				strip_block_markers(&mut sequence);
				RenderState::Done(sequence.flatten())
			}
			RenderState::ExtendResolve { mut child, base } => {
				debug!(base = %base, "resolving template inheritance");
				let blocks = extract_blocks(&mut child);
				let producer = lookup(registry, &base, TemplateRole::ExtendTarget)?;
				let mut sequence = producer.produce(data)?;
				replace_blocks(&mut sequence, &blocks);
				RenderState::Done(sequence.flatten())
			}
			RenderState::Done(output) => return Ok(output),
		};
		trace!(state = state.label(), "render state");
	}
}
