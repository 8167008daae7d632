//! The layout reconciliation engine.
//!
//! Runs after every layout-affecting event (content rebuild, container
//! resize, a widget's size change) and derives each widget's on-screen
//! origin from the text surface's line-segment geometry. Layout is always
//! completed synchronously before any geometry is read; a placeholder whose
//! range yields no segment is published as `origin = None`, hiding the widget
//! rather than misplacing it.
//!
//! Baseline alignment: the published y places the widget so its baseline sits
//! on the surrounding text's baseline. The ascender comes from the font of
//! the adjacent (preceding, else following, non-newline) character, is cached
//! per attachment for passes where that font cannot be resolved, and as a
//! last resort is synthesized from the widget's own height with a reserved
//! descent of [`SYNTHETIC_DESCENT_FRACTION`].

use std::ops::Range;

use crate::attachment::AttachmentRegistry;
use crate::buffer::StyledBuffer;
use crate::primitives::Point;
use crate::surface::TextSurface;

/// Fraction of a widget's own height reserved as descent when no
/// surrounding-text font is resolvable.
pub const SYNTHETIC_DESCENT_FRACTION: f32 = 0.20;

/// Reconcile the whole document.
///
/// Ensures layout for the full range, then publishes every attachment's
/// origin. Publication is idempotent, so repeated passes over unchanged
/// geometry notify nobody.
pub fn reconcile<S: TextSurface>(
    buffer: &StyledBuffer,
    surface: &mut S,
    registry: &mut AttachmentRegistry,
) {
    let range = buffer.full_range();
    surface.ensure_layout(range.clone());
    publish_range(buffer, surface, registry, range);
}

/// Re-layout exactly `range` and republish the attachments inside it.
///
/// Used when a widget's size changes: the rest of the document keeps its
/// layout, and attachments outside the range are untouched.
pub fn invalidate<S: TextSurface>(
    buffer: &StyledBuffer,
    surface: &mut S,
    registry: &mut AttachmentRegistry,
    range: Range<usize>,
) {
    surface.invalidate_layout(range.clone());
    surface.ensure_layout(range.clone());
    publish_range(buffer, surface, registry, range);
}

/// Publish origins for every placeholder inside `range`.
///
/// Deterministic: for a fixed buffer and fixed surface geometry the published
/// origins are the same whatever order non-overlapping ranges are processed
/// in. Each attachment is published only once its own geometry is final.
fn publish_range<S: TextSurface>(
    buffer: &StyledBuffer,
    surface: &S,
    registry: &mut AttachmentRegistry,
    range: Range<usize>,
) {
    let container = surface.container_offset();

    for (offset, attachment) in buffer.placeholders() {
        if !range.contains(&offset) {
            continue;
        }
        let Some(state) = registry.state(attachment.id) else {
            tracing::debug!(id = attachment.id.raw(), "placeholder without registry state skipped");
            continue;
        };

        let segments = surface.segments(offset..offset + 1);
        let Some(segment) = segments.first() else {
            registry.update_origin(attachment.id, None);
            continue;
        };

        let ascender = {
            let mut state = state.borrow_mut();
            match resolve_adjacent_ascent(buffer, surface, offset) {
                Some(ascent) => {
                    state.ascender = Some(ascent);
                    ascent
                }
                None => state
                    .ascender
                    .unwrap_or_else(|| fallback_ascender(state.size.height)),
            }
        };

        let origin = Point::new(
            container.x + segment.frame.x,
            container.y + segment.frame.y + segment.baseline - ascender,
        );
        registry.update_origin(attachment.id, Some(origin));
    }

    tracing::trace!(?range, "reconcile pass complete");
}

/// Ascent of the font at the adjacent character: preceding if there is one
/// and it is not a newline, else following.
fn resolve_adjacent_ascent<S: TextSurface>(
    buffer: &StyledBuffer,
    surface: &S,
    placeholder_offset: usize,
) -> Option<f32> {
    let preceding = placeholder_offset
        .checked_sub(1)
        .filter(|&i| buffer.char_at(i) != Some('\n'));
    let following = Some(placeholder_offset + 1)
        .filter(|&i| i < buffer.char_len() && buffer.char_at(i) != Some('\n'));

    preceding
        .and_then(|i| surface.ascent_at(i))
        .or_else(|| following.and_then(|i| surface.ascent_at(i)))
}

/// Synthetic ascender for a widget with no resolvable surrounding font:
/// the widget's own height minus the reserved descent.
fn fallback_ascender(height: f32) -> f32 {
    height - height * SYNTHETIC_DESCENT_FRACTION
}
