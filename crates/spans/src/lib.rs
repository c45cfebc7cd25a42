//! From untrusted service output to display-safe highlights.
//!
//! The reasoning service reports spans as `{text, startOffset, endOffset, ...}`
//! objects whose offsets are frequently off by a few characters, and whose JSON is
//! often truncated mid-stream. This crate:
//!
//! - decodes whole or partial responses into [`RawSpan`]s ([`parse_spans`], [`PartialSpanParser`]),
//! - validates each span against the authoritative paragraph text, recovering small offset
//!   drift within a bounded window ([`SpanCorrector`]),
//! - turns validated spans into [`Highlight`](drafter_primitives::Highlight)s ([`into_highlights`]),
//! - and resolves overlapping highlights into non-nesting render segments ([`resolve_overlaps`],
//!   [`render_segments`]).

mod parse;
mod partial;
mod raw;
mod resolve;
mod validate;

pub use parse::{extract_json_object, parse_spans};
pub use partial::{PartialSpanParser, parse_partial_spans};
pub use raw::RawSpan;
pub use resolve::{Segment, render_segments, resolve_overlaps};
pub use validate::{DEFAULT_CORRECTION_WINDOW, MAX_CORRECTION_WINDOW, Rejection, SpanCorrector, ValidSpan, into_highlights};
