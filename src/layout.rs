use rusttype::{point, Font, Scale};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("font reports a zero-width space glyph; cannot derive wrap columns")]
    ZeroWidthFont,
}

/// Horizontal placement policy for a field. The simplest template variant
/// pins every line's left edge to a fixed x; the others center each line
/// on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Center,
    Anchor(i32),
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    pub start_y: i32,
    pub max_width: u32,
    pub canvas_width: u32,
    pub line_spacing: f32,
    pub align: Align,
}

/// One wrapped line with its measured width and draw position. Produced
/// lazily, consumed by the drawing step, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    pub width: u32,
    pub x: i32,
    pub y: i32,
}

pub struct LayoutEngine<'f> {
    font: &'f Font<'static>,
    scale: Scale,
}

impl<'f> LayoutEngine<'f> {
    pub fn new(font: &'f Font<'static>, px: f32) -> Self {
        Self {
            font,
            scale: Scale::uniform(px),
        }
    }

    /// Wraps `text` into placed lines. Column width is estimated as
    /// `max_width / advance(space)` and the wrap is a greedy word wrap on
    /// that character count. This is a heuristic, not an exact pixel fit:
    /// rendered lines may over- or undershoot `max_width`. Words are
    /// never broken mid-word, so a single word wider than `max_width`
    /// comes out whole and overflows.
    pub fn wrap<'t>(
        &self,
        text: &'t str,
        params: LayoutParams,
    ) -> Result<Lines<'f, 't>, LayoutError> {
        let space_advance = self
            .font
            .glyph(' ')
            .scaled(self.scale)
            .h_metrics()
            .advance_width;
        if space_advance <= 0.0 {
            return Err(LayoutError::ZeroWidthFont);
        }

        let columns = ((params.max_width as f32 / space_advance) as usize).max(1);
        let words: Vec<&'t str> = text.split_whitespace().collect();

        Ok(Lines {
            font: self.font,
            scale: self.scale,
            words: words.into_iter().peekable(),
            columns,
            params,
            cursor_y: params.start_y as f32,
        })
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }
}

fn measure(font: &Font<'_>, scale: Scale, text: &str) -> (u32, u32) {
    let v_metrics = font.v_metrics(scale);
    let glyphs = font.layout(text, scale, point(0.0, v_metrics.ascent));

    let mut max_x: i32 = 0;
    let mut min_y: i32 = i32::MAX;
    let mut max_y: i32 = i32::MIN;
    for g in glyphs {
        if let Some(bb) = g.pixel_bounding_box() {
            max_x = max_x.max(bb.max.x);
            min_y = min_y.min(bb.min.y);
            max_y = max_y.max(bb.max.y);
        }
    }

    let height = if min_y == i32::MAX {
        // No visible glyphs; fall back to the font's nominal line height.
        (v_metrics.ascent - v_metrics.descent).ceil() as u32
    } else {
        (max_y - min_y).max(1) as u32
    };

    (max_x.max(0) as u32, height)
}

/// Lazy, finite, non-restartable sequence of wrapped lines. Top line
/// first, strictly increasing y. The cursor advances by each line's own
/// bounding-box height times the spacing factor, so lines with different
/// ascenders or descenders advance by different amounts.
pub struct Lines<'f, 't> {
    font: &'f Font<'static>,
    scale: Scale,
    words: std::iter::Peekable<std::vec::IntoIter<&'t str>>,
    columns: usize,
    params: LayoutParams,
    cursor_y: f32,
}

impl Lines<'_, '_> {
    /// Current vertical cursor. Equal to `start_y` until a line has been
    /// consumed.
    pub fn cursor_y(&self) -> i32 {
        self.cursor_y.round() as i32
    }
}

impl Iterator for Lines<'_, '_> {
    type Item = LayoutLine;

    fn next(&mut self) -> Option<LayoutLine> {
        let first = self.words.next()?;
        let mut line = String::from(first);
        let mut count = first.chars().count();

        while let Some(next) = self.words.peek() {
            let added = 1 + next.chars().count();
            if count + added > self.columns {
                break;
            }
            line.push(' ');
            line.push_str(next);
            count += added;
            self.words.next();
        }

        let (width, height) = measure(self.font, self.scale, &line);
        let x = match self.params.align {
            Align::Center => (self.params.canvas_width as i32 - width as i32) / 2,
            Align::Anchor(x) => x,
        };
        let y = self.cursor_y.round() as i32;

        self.cursor_y += (height as f32 * self.params.line_spacing).max(1.0);

        Some(LayoutLine {
            text: line,
            width,
            x,
            y,
        })
    }
}
