//! The text surface boundary.
//!
//! A [`TextSurface`] is whatever actually lays the styled buffer out:
//! a shaping engine, a host toolkit's text view, or a scripted fixture in
//! tests. The engine drives it through this one capability set; backends are
//! selected at build time (the `cosmic` feature enables the cosmic-text
//! implementation) rather than branched on at runtime.
//!
//! Text extraction is deliberately absent from this trait. Extraction lives
//! on [`crate::block::TextBlock`], which routes every outgoing string through
//! the replacement interceptor; keeping it off the surface makes a bypassing
//! code path impossible rather than merely forbidden.

use std::ops::Range;

use crate::buffer::StyledBuffer;
use crate::primitives::{Point, Rect};

/// Geometry of one laid-out line segment.
///
/// Produced transiently by the surface for a queried char range; never
/// persisted. `frame` is relative to the surface's own origin; callers add
/// [`TextSurface::container_offset`] to reach view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub frame: Rect,
    /// Baseline offset from the top of `frame`.
    pub baseline: f32,
}

/// Capability contract any backing text-layout engine must satisfy.
pub trait TextSurface {
    /// Replace the displayed content. Attachment attributes must pass
    /// through unmodified.
    fn set_buffer(&mut self, buffer: &StyledBuffer);

    /// Synchronously complete layout for a char range. Geometry queries for
    /// the range are valid only after this returns.
    fn ensure_layout(&mut self, range: Range<usize>);

    /// Line-segment geometry for a char range, in document order. A range
    /// that is not currently laid out yields no segments. Callers may stop
    /// consuming early.
    fn segments(&self, range: Range<usize>) -> Vec<LineSegment>;

    /// Mark a char range's layout stale without touching the rest of the
    /// document.
    fn invalidate_layout(&mut self, range: Range<usize>);

    /// Current text-container inset/origin in view coordinates.
    fn container_offset(&self) -> Point;

    /// Resolved font ascent of the character at `char_index`, if the range
    /// is laid out and a font is resolvable there. This is the explicit
    /// accessor the engine uses to align widget baselines to text baselines.
    fn ascent_at(&self, char_index: usize) -> Option<f32>;
}

#[cfg(feature = "cosmic")]
pub mod cosmic;

/// Scripted surface for tests: a monospace grid with configurable metrics,
/// hideable ranges, and call recording.
#[cfg(test)]
pub(crate) mod fixture {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::ops::Range;

    use super::{LineSegment, TextSurface};
    use crate::buffer::StyledBuffer;
    use crate::primitives::{Point, Rect};

    pub(crate) struct FixtureSurface {
        chars: Vec<char>,
        pub char_width: f32,
        pub line_height: f32,
        /// Baseline offset from line top; doubles as the default ascent.
        pub ascent: f32,
        /// Chars per line before wrapping.
        pub wrap: usize,
        pub container: Point,
        /// Char indices that currently yield no geometry (virtualized away).
        pub hidden: HashSet<usize>,
        /// When false, `ascent_at` resolves nothing anywhere.
        pub fonts_resolvable: bool,
        /// Per-char ascent overrides.
        pub ascents: HashMap<usize, f32>,
        valid: RefCell<HashSet<usize>>,
        pub ensure_calls: RefCell<Vec<Range<usize>>>,
        pub invalidations: RefCell<Vec<Range<usize>>>,
    }

    impl FixtureSurface {
        pub fn new() -> Self {
            Self {
                chars: Vec::new(),
                char_width: 8.0,
                line_height: 16.0,
                ascent: 12.0,
                wrap: usize::MAX,
                container: Point::ORIGIN,
                hidden: HashSet::new(),
                fonts_resolvable: true,
                ascents: HashMap::new(),
                valid: RefCell::new(HashSet::new()),
                ensure_calls: RefCell::new(Vec::new()),
                invalidations: RefCell::new(Vec::new()),
            }
        }

        /// Grid position of a char: (line, column).
        fn grid_position(&self, char_index: usize) -> (usize, usize) {
            let mut line = 0usize;
            let mut col = 0usize;
            for (i, &c) in self.chars.iter().enumerate() {
                if i == char_index {
                    break;
                }
                if c == '\n' || col + 1 >= self.wrap {
                    line += 1;
                    col = 0;
                } else {
                    col += 1;
                }
            }
            (line, col)
        }

        fn char_frame(&self, char_index: usize) -> Rect {
            let (line, col) = self.grid_position(char_index);
            Rect::new(
                col as f32 * self.char_width,
                line as f32 * self.line_height,
                self.char_width,
                self.line_height,
            )
        }
    }

    impl TextSurface for FixtureSurface {
        fn set_buffer(&mut self, buffer: &StyledBuffer) {
            self.chars = buffer.text().chars().collect();
            self.valid.borrow_mut().clear();
        }

        fn ensure_layout(&mut self, range: Range<usize>) {
            self.ensure_calls.borrow_mut().push(range.clone());
            self.valid.borrow_mut().extend(range);
        }

        fn segments(&self, range: Range<usize>) -> Vec<LineSegment> {
            let mut segments: Vec<LineSegment> = Vec::new();
            let end = range.end.min(self.chars.len());
            for i in range.start..end {
                if self.hidden.contains(&i) || !self.valid.borrow().contains(&i) {
                    continue;
                }
                let frame = self.char_frame(i);
                // Merge consecutive chars on the same line into one segment.
                if let Some(last) = segments.last_mut() {
                    if (last.frame.y - frame.y).abs() < f32::EPSILON
                        && (last.frame.right() - frame.x).abs() < f32::EPSILON
                    {
                        last.frame.width += frame.width;
                        continue;
                    }
                }
                segments.push(LineSegment {
                    frame,
                    baseline: self.ascent,
                });
            }
            segments
        }

        fn invalidate_layout(&mut self, range: Range<usize>) {
            self.invalidations.borrow_mut().push(range.clone());
            let mut valid = self.valid.borrow_mut();
            for i in range {
                valid.remove(&i);
            }
        }

        fn container_offset(&self) -> Point {
            self.container
        }

        fn ascent_at(&self, char_index: usize) -> Option<f32> {
            if !self.fonts_resolvable || char_index >= self.chars.len() {
                return None;
            }
            if !self.valid.borrow().contains(&char_index) {
                return None;
            }
            Some(
                self.ascents
                    .get(&char_index)
                    .copied()
                    .unwrap_or(self.ascent),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::FixtureSurface;
    use super::*;
    use crate::buffer::Aggregator;
    use crate::fragment::{Content, Fragment};
    use crate::style::StyleDefaults;

    fn buffer_of(text: &str) -> StyledBuffer {
        Aggregator::new(StyleDefaults::default())
            .build(&Content::new().push(Fragment::plain(text)))
    }

    #[test]
    fn segments_require_ensure_layout() {
        let mut surface = FixtureSurface::new();
        surface.set_buffer(&buffer_of("abc"));

        assert!(surface.segments(0..3).is_empty());
        surface.ensure_layout(0..3);
        assert_eq!(surface.segments(0..3).len(), 1);
    }

    #[test]
    fn consecutive_chars_merge_into_one_segment() {
        let mut surface = FixtureSurface::new();
        surface.set_buffer(&buffer_of("abcd"));
        surface.ensure_layout(0..4);

        let segments = surface.segments(0..4);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].frame.width, 4.0 * surface.char_width);
        assert_eq!(segments[0].baseline, surface.ascent);
    }

    #[test]
    fn newline_splits_segments_across_lines() {
        let mut surface = FixtureSurface::new();
        surface.set_buffer(&buffer_of("ab\ncd"));
        surface.ensure_layout(0..5);

        let segments = surface.segments(0..5);
        assert!(segments.len() >= 2);
        assert_eq!(segments[0].frame.y, 0.0);
        assert_eq!(segments.last().unwrap().frame.y, surface.line_height);
    }

    #[test]
    fn hidden_chars_yield_no_geometry() {
        let mut surface = FixtureSurface::new();
        surface.set_buffer(&buffer_of("abc"));
        surface.ensure_layout(0..3);
        surface.hidden.insert(1);

        assert!(surface.segments(1..2).is_empty());
        assert_eq!(surface.segments(0..1).len(), 1);
    }

    #[test]
    fn invalidate_clears_validity_for_exactly_the_range() {
        let mut surface = FixtureSurface::new();
        surface.set_buffer(&buffer_of("abcd"));
        surface.ensure_layout(0..4);
        surface.invalidate_layout(1..3);

        assert!(surface.segments(1..3).is_empty());
        assert_eq!(surface.segments(0..1).len(), 1);
        assert_eq!(surface.segments(3..4).len(), 1);
    }

    #[test]
    fn ascent_tracks_overrides_and_resolvability() {
        let mut surface = FixtureSurface::new();
        surface.set_buffer(&buffer_of("ab"));
        surface.ensure_layout(0..2);
        surface.ascents.insert(1, 20.0);

        assert_eq!(surface.ascent_at(0), Some(12.0));
        assert_eq!(surface.ascent_at(1), Some(20.0));

        surface.fonts_resolvable = false;
        assert_eq!(surface.ascent_at(0), None);
    }
}
