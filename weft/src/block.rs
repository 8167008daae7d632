//! The text block façade.
//!
//! [`TextBlock`] owns the whole pipeline for one selectable block: the
//! aggregator, the current content and its styled buffer, the attachment
//! registry, and the text surface. Hosts rebuild content when upstream state
//! changes, report widget size changes, and read published origins back; all
//! extraction goes through the replacement interceptor because these methods
//! are the only way text leaves the block.

use std::cell::RefCell;
use std::collections::HashSet;
use std::ops::Range;
use std::rc::Rc;

use crate::attachment::{AttachmentId, AttachmentRegistry};
use crate::buffer::{Aggregator, StyledBuffer};
use crate::error::WeftError;
use crate::extract;
use crate::fragment::{Content, StyledText};
use crate::primitives::{Point, Rect, Size};
use crate::reconcile;
use crate::selection::Selection;
use crate::style::StyleDefaults;
use crate::surface::TextSurface;

pub struct TextBlock<S: TextSurface> {
    aggregator: Aggregator,
    content: Content,
    buffer: StyledBuffer,
    registry: AttachmentRegistry,
    surface: S,
    selection: Option<Selection>,
    /// Identities whose size changed since the last flush, queued by the
    /// per-attachment size observers.
    resized: Rc<RefCell<Vec<AttachmentId>>>,
}

impl<S: TextSurface> TextBlock<S> {
    pub fn new(surface: S, defaults: StyleDefaults) -> Self {
        let aggregator = Aggregator::new(defaults);
        let content = Content::new();
        let buffer = aggregator.build(&content);
        let mut block = Self {
            aggregator,
            content,
            buffer,
            registry: AttachmentRegistry::new(),
            surface,
            selection: None,
            resized: Rc::new(RefCell::new(Vec::new())),
        };
        block.surface.set_buffer(&block.buffer);
        block
    }

    /// Replace the content and run a full layout pass.
    ///
    /// Attachment state survives by identity: a widget present before and
    /// after the rebuild keeps its accumulated size and origin, so it does
    /// not flicker while the new layout settles. Identities omitted from the
    /// new content are dropped.
    pub fn rebuild(&mut self, content: impl Into<Content>) {
        self.content = content.into();
        self.buffer = self.aggregator.build(&self.content);

        let live: HashSet<AttachmentId> =
            self.content.attachments().map(|a| a.id).collect();
        self.registry.retain(&live);

        for attachment in self.content.attachments() {
            self.registry.resolve(attachment);
            let queue = Rc::clone(&self.resized);
            self.registry.observe_size(attachment.id, move |id, _| {
                queue.borrow_mut().push(id);
            });
        }

        self.surface.set_buffer(&self.buffer);
        self.selection = self.selection.map(|s| s.clamped(self.buffer.char_len()));
        reconcile::reconcile(&self.buffer, &mut self.surface, &mut self.registry);
    }

    /// Re-run the full reconciliation pass (container resized, fonts
    /// changed, or any other whole-document layout event).
    pub fn relayout(&mut self) {
        reconcile::reconcile(&self.buffer, &mut self.surface, &mut self.registry);
    }

    /// Report a widget's new intrinsic size.
    ///
    /// Unchanged sizes and unknown identities are no-ops. An actual change
    /// invalidates exactly the placeholder's range and republishes the
    /// affected origins; the rest of the document keeps its layout.
    pub fn update_widget_size(&mut self, id: AttachmentId, size: Size) {
        self.registry.update_size(id, size);
        self.flush_resizes();
    }

    fn flush_resizes(&mut self) {
        let mut pending: Vec<AttachmentId> = self.resized.borrow_mut().drain(..).collect();
        pending.dedup();
        for id in pending {
            let Some(offset) = self
                .buffer
                .placeholders()
                .find(|(_, a)| a.id == id)
                .map(|(offset, _)| offset)
            else {
                continue;
            };
            reconcile::invalidate(
                &self.buffer,
                &mut self.surface,
                &mut self.registry,
                offset..offset + 1,
            );
        }
    }

    /// Published origin for a widget, `None` while it cannot be placed.
    pub fn widget_origin(&self, id: AttachmentId) -> Option<Point> {
        self.registry.state(id)?.borrow().origin
    }

    // ---------------------------------------------------------------------
    // Extraction: the interceptor boundary
    // ---------------------------------------------------------------------

    /// Extract a char range as plain text, widget placeholders substituted
    /// by their replacement text.
    pub fn extract_plain(&self, range: Range<usize>) -> Result<String, WeftError> {
        self.check_range(&range)?;
        Ok(extract::extract_plain(&self.buffer, range))
    }

    /// Extract the whole block as plain text.
    pub fn extract_plain_all(&self) -> String {
        extract::extract_plain(&self.buffer, self.buffer.full_range())
    }

    /// Extract a char range as styled text, replacements substituted and
    /// made visible against the block defaults.
    pub fn extract_styled(&self, range: Range<usize>) -> Result<StyledText, WeftError> {
        self.check_range(&range)?;
        Ok(extract::extract_styled(
            &self.buffer,
            range,
            &self.aggregator.defaults,
        ))
    }

    /// Extract the whole block as styled text.
    pub fn extract_styled_all(&self) -> StyledText {
        extract::extract_styled(
            &self.buffer,
            self.buffer.full_range(),
            &self.aggregator.defaults,
        )
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), WeftError> {
        let len = self.buffer.char_len();
        if range.start > range.end || range.end > len {
            return Err(WeftError::RangeOutOfBounds {
                range: range.clone(),
                len,
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn select(&mut self, anchor: usize, focus: usize) {
        let len = self.buffer.char_len();
        self.selection = Some(Selection::new(anchor, focus).clamped(len));
    }

    pub fn select_all(&mut self) {
        self.selection = Some(Selection::all(self.buffer.char_len()));
    }

    pub fn extend_selection(&mut self, focus: usize) {
        let len = self.buffer.char_len();
        if let Some(selection) = &mut self.selection {
            selection.extend(focus.min(len));
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// The selected text as plain text, substituted like any extraction.
    pub fn extract_selection_plain(&self) -> Option<String> {
        let selection = self.selection.filter(|s| !s.is_collapsed())?;
        Some(extract::extract_plain(&self.buffer, selection.normalized()))
    }

    /// The selected text as styled text.
    pub fn extract_selection_styled(&self) -> Option<StyledText> {
        let selection = self.selection.filter(|s| !s.is_collapsed())?;
        Some(extract::extract_styled(
            &self.buffer,
            selection.normalized(),
            &self.aggregator.defaults,
        ))
    }

    /// Highlight rectangles for the current selection, in view coordinates.
    pub fn highlight_rects(&self) -> Vec<Rect> {
        let Some(selection) = self.selection.filter(|s| !s.is_collapsed()) else {
            return Vec::new();
        };
        let offset = self.surface.container_offset();
        self.surface
            .segments(selection.normalized())
            .into_iter()
            .map(|segment| segment.frame.translate(offset))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn buffer(&self) -> &StyledBuffer {
        &self.buffer
    }

    pub fn registry(&self) -> &AttachmentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AttachmentRegistry {
        &mut self.registry
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access. After mutating anything layout-affecting
    /// (container size, offsets), call [`TextBlock::relayout`].
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
