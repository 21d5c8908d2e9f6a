use std::collections::HashMap;

use crate::directive::Directive;
use crate::segment::SegmentSequence;

/// Block contents keyed by block name, as defined by a child template.
pub type BlockMap = HashMap<String, String>;

/// Walker state while collecting blocks from a child template.
#[derive(Debug, Default, PartialEq, Eq)]
enum ExtractState {
	#[default]
	Idle,
	InBlock { name: String, buffer: String },
}

impl ExtractState {
	fn append(&mut self, text: &str) {
		if let Self::InBlock { buffer, .. } = self {
			buffer.push_str(text);
		}
	}

	/// Open a new block. Whatever the previous block collected so far is
	/// dropped without being committed.
	fn open(&mut self, name: &str) {
		if let Self::InBlock { name: open, .. } = self {
			tracing::trace!(
				abandoned = %open,
				opened = name,
				"block opened before the previous one was closed"
			);
		}

		*self = Self::InBlock {
			name: name.to_string(),
			buffer: String::new(),
		};
	}

	fn close(&mut self, blocks: &mut BlockMap) {
		if let Self::InBlock { name, buffer } = std::mem::take(self) {
			blocks.insert(name, buffer);
		}
	}
}

/// Collect the named blocks of a child template and zero every block marker
/// so none of the marker text reaches the output.
///
/// Blocks do not nest. A block start while another block is still open
/// abandons the open one, and a block that is never closed is never
/// committed. Markers other than block starts and ends are left untouched.
pub fn extract_blocks(sequence: &mut SegmentSequence) -> BlockMap {
	let mut blocks = BlockMap::new();
	let mut state = ExtractState::Idle;

	for segment in sequence.iter_mut() {
		if segment.is_static() {
			state.append(segment.value());
			continue;
		}

		match segment.directive() {
			Some(Directive::BlockEnd) => {
				state.close(&mut blocks);
				segment.zero();
			}
			Some(Directive::BlockStart(name)) => {
				state.open(name);
				segment.zero();
			}
			Some(Directive::Extend(_)) | None => state.append(segment.value()),
		}
	}

	if let ExtractState::InBlock { name, .. } = &state {
		tracing::debug!(block = %name, "unterminated block discarded");
	}

	blocks
}

/// Walker state while substituting child blocks into a base template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ReplaceState {
	#[default]
	Scanning,
	Suppressing,
}

/// Substitute the child's blocks into the base template in place.
///
/// A block start with an override takes the override content and everything
/// up to the matching block end is erased. A block start without an override
/// is zeroed and the base's own default content stays.
pub fn replace_blocks(sequence: &mut SegmentSequence, blocks: &BlockMap) {
	let mut state = ReplaceState::Scanning;

	for segment in sequence.iter_mut() {
		match state {
			ReplaceState::Suppressing => {
				if segment.directive() == Some(Directive::BlockEnd) {
					state = ReplaceState::Scanning;
				}
				segment.zero();
			}
			ReplaceState::Scanning => {
				match segment.directive() {
					Some(Directive::BlockStart(name)) => {
						if let Some(content) = blocks.get(name) {
							tracing::trace!(block = name, "block overridden by child");
							segment.replace(content.as_str());
							state = ReplaceState::Suppressing;
						} else {
							segment.zero();
						}
					}
					Some(Directive::BlockEnd) => segment.zero(),
					Some(Directive::Extend(_)) | None => {}
				}
			}
		}
	}
}

/// Zero every block start and block end marker, leaving the content between
/// them in place.
pub fn strip_block_markers(sequence: &mut SegmentSequence) {
	for segment in sequence.iter_mut() {
		if segment.directive().is_some_and(|d| d.is_block_marker()) {
			segment.zero();
		}
	}
}
