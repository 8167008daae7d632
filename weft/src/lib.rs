//! Weft: inline widget attachments for selectable, styled text.
//!
//! Weft turns a sequence of content fragments (plain text, styled text, and
//! embedded widgets) into a single selectable, copyable text block. The text
//! surface lays out each widget as one placeholder glyph; after every layout
//! pass the reconciliation engine reads the surface's line-segment geometry
//! back and publishes each widget's on-screen origin, aligned to the
//! surrounding text baseline. Copy and selection substitute each widget's
//! replacement text so pasted content never contains raw placeholders.
//!
//! # Architecture
//!
//! `Content` (fragments) is aggregated into a `StyledBuffer` and handed to a
//! `TextSurface` implementation. `reconcile` maps each placeholder's char
//! range to segment geometry and publishes origins through the
//! `AttachmentRegistry`, which preserves widget state across content rebuilds
//! by identity. `TextBlock` ties the pieces together and is the only way text
//! leaves the crate, so replacement substitution cannot be bypassed.
//!
//! # Usage
//!
//! ```ignore
//! use weft::{AttachmentRef, Fragment, Size, StyleDefaults, TextBlock};
//!
//! let widget = AttachmentRef::named("avatar", Size::new(16.0, 16.0))
//!     .replacement_plain("@nadia");
//! let mut block = TextBlock::new(surface, StyleDefaults::default());
//! block.rebuild(vec![
//!     Fragment::plain("Hello "),
//!     Fragment::widget(widget),
//!     Fragment::plain("!"),
//! ]);
//! block.relayout();
//! assert_eq!(block.extract_plain_all(), "Hello @nadia!");
//! ```

// Core primitives
pub mod primitives;
pub mod style;
pub mod error;

// Content model
pub mod fragment;
pub mod buffer;

// Attachment identity and state
pub mod attachment;

// Text surface boundary (trait + backends)
pub mod surface;

// Layout reconciliation
pub mod reconcile;

// Selection and extraction
pub mod selection;
pub mod extract;

// Block façade
pub mod block;

// Re-export core types
pub use primitives::{Color, Point, Rect, Size};
pub use style::{
    FontFamily, ResolvedStyle, StyleDefaults, TextAlign, TextStyle, Truncation, WritingDirection,
};
pub use error::WeftError;
pub use fragment::{Content, Fragment, StyledRun, StyledText};
#[cfg(feature = "markdown")]
pub use fragment::markdown;
pub use buffer::{Aggregator, BufferRun, StyledBuffer, PLACEHOLDER};
pub use attachment::{
    AttachmentId, AttachmentPhase, AttachmentRef, AttachmentRegistry, AttachmentState,
};
pub use surface::{LineSegment, TextSurface};
pub use reconcile::SYNTHETIC_DESCENT_FRACTION;
pub use selection::Selection;
pub use block::TextBlock;

#[cfg(feature = "cosmic")]
pub use surface::cosmic::CosmicSurface;
