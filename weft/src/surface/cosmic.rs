//! cosmic-text backed [`TextSurface`].
//!
//! Shapes the buffer text with a shared global `FontSystem` (expensive to
//! create, so one per process) and answers geometry queries from the shaped
//! layout runs. Each buffer run becomes one rich-text span, so per-run
//! family, weight, slant and color take part in shaping. Char-indexed ranges
//! from the engine are mapped to the byte offsets cosmic-text works in; glyph
//! byte ranges are relative to their source line, so the mapping goes through
//! per-line start offsets.
//!
//! Placeholder characters are shaped like any other glyph; reserving the
//! widget's intrinsic width inside line breaking needs an inline-box capable
//! layout engine and is out of this backend's hands. Origins derived from the
//! placeholder's segment remain correct either way.

use std::ops::Range;
use std::sync::{Mutex, OnceLock};

use cosmic_text::{
    Align, Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, Weight, Wrap,
};

use super::{LineSegment, TextSurface};
use crate::buffer::StyledBuffer;
use crate::primitives::{Color, Point, Rect};
use crate::style::{FontFamily, ResolvedStyle, TextAlign, Truncation};

/// Global font system, shared across surface instances.
static FONT_SYSTEM: OnceLock<Mutex<FontSystem>> = OnceLock::new();

fn font_system() -> &'static Mutex<FontSystem> {
    FONT_SYSTEM.get_or_init(|| Mutex::new(FontSystem::new()))
}

fn cosmic_family(family: &FontFamily) -> Family<'_> {
    match family {
        FontFamily::Monospace => Family::Monospace,
        FontFamily::SansSerif => Family::SansSerif,
        FontFamily::Serif => Family::Serif,
        FontFamily::Named(name) => Family::Name(name),
    }
}

fn cosmic_color(color: Color) -> cosmic_text::Color {
    cosmic_text::Color::rgba(
        (color.r * 255.0) as u8,
        (color.g * 255.0) as u8,
        (color.b * 255.0) as u8,
        (color.a * 255.0) as u8,
    )
}

/// `None` keeps cosmic-text's natural per-line-direction alignment, which is
/// what `Start` means.
fn cosmic_align(align: TextAlign) -> Option<Align> {
    match align {
        TextAlign::Start => None,
        TextAlign::Center => Some(Align::Center),
        TextAlign::End => Some(Align::End),
        TextAlign::Justified => Some(Align::Justified),
    }
}

/// Clipping and tail elision are drawn by the host; layout just stops
/// wrapping so the overflow exists to clip or elide.
fn cosmic_wrap(truncation: Truncation) -> Wrap {
    match truncation {
        Truncation::Wrap => Wrap::WordOrGlyph,
        Truncation::Clip | Truncation::Tail => Wrap::None,
    }
}

fn run_attrs(style: &ResolvedStyle) -> Attrs<'_> {
    let mut attrs = Attrs::new()
        .family(cosmic_family(&style.family))
        .color(cosmic_color(style.foreground));
    if style.bold {
        attrs = attrs.weight(Weight::BOLD);
    }
    if style.italic {
        attrs = attrs.style(Style::Italic);
    }
    attrs
}

/// Byte offset of each char, plus a trailing entry for the text length.
fn char_byte_offsets(text: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    offsets.push(text.len());
    offsets
}

/// Byte offset at which each source line starts ('\n'-separated).
fn line_byte_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

pub struct CosmicSurface {
    buffer: Option<Buffer>,
    text: String,
    char_offsets: Vec<usize>,
    line_starts: Vec<usize>,
    /// Wrap width; `None` lays out unconstrained.
    width: Option<f32>,
    container: Point,
    shaped: bool,
}

impl CosmicSurface {
    pub fn new() -> Self {
        Self {
            buffer: None,
            text: String::new(),
            char_offsets: vec![0],
            line_starts: vec![0],
            width: None,
            container: Point::ORIGIN,
            shaped: false,
        }
    }

    pub fn with_width(width: f32) -> Self {
        let mut surface = Self::new();
        surface.width = Some(width);
        surface
    }

    /// Change the wrap width; layout becomes stale until the next ensure.
    pub fn set_width(&mut self, width: Option<f32>) {
        if self.width == width {
            return;
        }
        self.width = width;
        if let Some(buffer) = &mut self.buffer {
            let mut fs = font_system().lock().unwrap();
            buffer.set_size(&mut fs, width.or(Some(f32::MAX)), Some(f32::MAX));
        }
        self.shaped = false;
    }

    pub fn set_container_offset(&mut self, offset: Point) {
        self.container = offset;
    }

    fn byte_for_char(&self, char_index: usize) -> usize {
        self.char_offsets
            .get(char_index)
            .copied()
            .unwrap_or(self.text.len())
    }

    /// Walk shaped runs, calling `visit` with each run's line-relative byte
    /// range lifted to document byte offsets. Stops when `visit` says so.
    fn for_each_glyph<F>(&self, mut visit: F)
    where
        F: FnMut(Range<usize>, f32, f32, f32, f32, f32) -> bool,
    {
        let Some(buffer) = &self.buffer else {
            return;
        };
        for run in buffer.layout_runs() {
            let line_start = self.line_starts.get(run.line_i).copied().unwrap_or(0);
            for glyph in run.glyphs.iter() {
                let bytes = (line_start + glyph.start)..(line_start + glyph.end);
                let keep_going = visit(
                    bytes,
                    glyph.x,
                    glyph.w,
                    run.line_top,
                    run.line_y,
                    run.line_height,
                );
                if !keep_going {
                    return;
                }
            }
        }
    }
}

impl Default for CosmicSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSurface for CosmicSurface {
    fn set_buffer(&mut self, styled: &StyledBuffer) {
        let defaults = &styled.defaults;
        let metrics = Metrics::new(
            defaults.font_size,
            defaults.line_height + defaults.line_spacing,
        );

        let mut fs = font_system().lock().unwrap();
        let mut buffer = Buffer::new(&mut fs, metrics);
        buffer.set_size(&mut fs, self.width.or(Some(f32::MAX)), Some(f32::MAX));
        buffer.set_wrap(&mut fs, cosmic_wrap(defaults.truncation));

        let text = styled.text();
        let offsets = char_byte_offsets(text);
        let spans = styled.runs().iter().map(|run| {
            let start = offsets.get(run.range.start).copied().unwrap_or(text.len());
            let end = offsets.get(run.range.end).copied().unwrap_or(text.len());
            (&text[start..end], run_attrs(&run.style))
        });
        buffer.set_rich_text(
            &mut fs,
            spans,
            Attrs::new().family(cosmic_family(&defaults.family)),
            Shaping::Advanced,
            cosmic_align(defaults.align),
        );

        self.text = text.to_string();
        self.char_offsets = offsets;
        self.line_starts = line_byte_starts(&self.text);
        self.buffer = Some(buffer);
        self.shaped = false;
    }

    fn ensure_layout(&mut self, _range: Range<usize>) {
        // cosmic-text shapes whole lines and tracks per-line dirtiness
        // internally; any range request completes the full pass.
        let Some(buffer) = &mut self.buffer else {
            return;
        };
        let mut fs = font_system().lock().unwrap();
        buffer.shape_until_scroll(&mut fs, false);
        self.shaped = true;
    }

    fn segments(&self, range: Range<usize>) -> Vec<LineSegment> {
        if !self.shaped || range.start >= range.end {
            return Vec::new();
        }
        let byte_range = self.byte_for_char(range.start)..self.byte_for_char(range.end);

        // One segment per layout line touched by the range, keyed by line top.
        // Glyphs are not byte-ordered inside RTL runs, so the walk never
        // stops early.
        let mut segments: Vec<LineSegment> = Vec::new();
        let mut current_top: Option<f32> = None;
        self.for_each_glyph(|bytes, x, w, line_top, line_y, line_height| {
            if bytes.end <= byte_range.start || bytes.start >= byte_range.end {
                return true;
            }
            if current_top.is_none_or(|top| (line_top - top).abs() > f32::EPSILON) {
                current_top = Some(line_top);
                segments.push(LineSegment {
                    frame: Rect::new(x, line_top, w, line_height),
                    baseline: line_y - line_top,
                });
            } else if let Some(segment) = segments.last_mut() {
                let left = segment.frame.x.min(x);
                let right = segment.frame.right().max(x + w);
                segment.frame.x = left;
                segment.frame.width = right - left;
            }
            true
        });
        segments
    }

    fn invalidate_layout(&mut self, _range: Range<usize>) {
        // Line-level dirtiness lives inside cosmic-text; the next ensure
        // pass reshapes whatever is stale.
        self.shaped = false;
    }

    fn container_offset(&self) -> Point {
        self.container
    }

    fn ascent_at(&self, char_index: usize) -> Option<f32> {
        if !self.shaped || char_index >= self.char_offsets.len().saturating_sub(1) {
            return None;
        }
        let byte = self.byte_for_char(char_index);
        let mut ascent = None;
        self.for_each_glyph(|bytes, _x, _w, line_top, line_y, _h| {
            if bytes.contains(&byte) {
                ascent = Some(line_y - line_top);
                return false;
            }
            true
        });
        ascent
    }
}
