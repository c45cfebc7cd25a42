//! Core types for paragraph analysis: paragraphs, highlights, issue categories, and
//! char-offset text helpers.

/// Validated highlight records and their identifiers.
pub mod highlight;
/// Fixed issue category and priority enumerations.
pub mod issue;
/// Paragraph identity and content.
pub mod paragraph;
/// Char-indexed slicing over UTF-8 strings.
pub mod text;

pub use highlight::{Highlight, HighlightId};
pub use issue::{IssueType, Priority, UnknownVariant};
pub use paragraph::{Paragraph, ParagraphId};
pub use text::{CharIdx, CharIndex, char_len, is_blank, preview};
