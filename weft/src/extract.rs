//! The selection/copy interceptor.
//!
//! Every extraction of buffer text (for the clipboard, for accessibility,
//! for drag payloads) passes through here. Placeholders with replacement
//! text are substituted by it; placeholders without replacement are dropped
//! silently from plain output and contribute an empty styled slot, so the
//! raw placeholder code point never reaches pasted content. Substituted
//! styled text inherits the block's default foreground color, font family
//! and size wherever it does not specify its own, so it cannot render
//! invisibly on the destination surface.

use std::ops::Range;

use crate::buffer::StyledBuffer;
use crate::fragment::{StyledRun, StyledText};
use crate::style::{StyleDefaults, TextStyle};

/// Extract a char range as plain text, placeholders substituted.
pub fn extract_plain(buffer: &StyledBuffer, range: Range<usize>) -> String {
    let mut out = String::new();
    for run in buffer.runs() {
        let Some(overlap) = clip(&run.range, &range) else {
            continue;
        };
        match &run.attachment {
            Some(attachment) => {
                if let Some(replacement) = &attachment.replacement {
                    out.push_str(&replacement.to_plain());
                }
                // No replacement: the placeholder is dropped, not emitted.
            }
            None => {
                out.push_str(char_slice(
                    buffer.text(),
                    relative(&overlap, run.range.start),
                    run.range.start,
                ));
            }
        }
    }
    out
}

/// Extract a char range as styled text, placeholders substituted.
///
/// Replacement runs inherit `defaults` for foreground, family and size when
/// unset; regular runs carry their already-resolved attributes explicitly.
pub fn extract_styled(
    buffer: &StyledBuffer,
    range: Range<usize>,
    defaults: &StyleDefaults,
) -> StyledText {
    let mut runs = Vec::new();
    for run in buffer.runs() {
        let Some(overlap) = clip(&run.range, &range) else {
            continue;
        };
        match &run.attachment {
            Some(attachment) => {
                let Some(replacement) = &attachment.replacement else {
                    continue; // empty styled slot
                };
                for rep in &replacement.runs {
                    if rep.text.is_empty() {
                        continue;
                    }
                    runs.push(StyledRun::new(
                        rep.text.clone(),
                        inherit_visibility(&rep.style, defaults),
                    ));
                }
            }
            None => {
                let text = char_slice(
                    buffer.text(),
                    relative(&overlap, run.range.start),
                    run.range.start,
                );
                runs.push(StyledRun::new(text, run.style.to_text_style()));
            }
        }
    }
    StyledText { runs }
}

/// Fill foreground, family and size from the defaults where unset.
///
/// Only the attributes that decide visibility are inherited; everything else
/// stays exactly as the replacement author wrote it.
fn inherit_visibility(style: &TextStyle, defaults: &StyleDefaults) -> TextStyle {
    let mut out = style.clone();
    if out.foreground.is_none() {
        out.foreground = Some(defaults.foreground);
    }
    if out.family.is_none() {
        out.family = Some(defaults.family.clone());
    }
    if out.font_size.is_none() {
        out.font_size = Some(defaults.font_size);
    }
    out
}

/// Intersection of two char ranges, if non-empty.
fn clip(run: &Range<usize>, wanted: &Range<usize>) -> Option<Range<usize>> {
    let start = run.start.max(wanted.start);
    let end = run.end.min(wanted.end);
    (start < end).then_some(start..end)
}

fn relative(overlap: &Range<usize>, run_start: usize) -> Range<usize> {
    (overlap.start - run_start)..(overlap.end - run_start)
}

/// Slice `text` by char offsets, where `run_start` chars precede the run in
/// the buffer and `range` is relative to the run.
fn char_slice(text: &str, range: Range<usize>, run_start: usize) -> &str {
    let mut indices = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .skip(run_start + range.start);
    let start = indices.next().unwrap_or(text.len());
    let end = indices
        .nth((range.end - range.start).saturating_sub(1))
        .unwrap_or(text.len());
    &text[start..end.max(start)]
}
