use super::canvas::{Canvas, ColorMode, RenderMode, color_to_fg};
use super::text::{Style, TextLayer, WIDE_TAIL, char_width};
use super::{braille, halfblock};

/// A canvas glyph that replaces the text cell underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub ch: char,
    /// SGR parameters for the glyph color; empty for the default color.
    pub sgr: String,
}

impl Overlay {
    pub fn plain(ch: char) -> Self {
        Overlay {
            ch,
            sgr: String::new(),
        }
    }
}

fn text_sgr(canvas: &Canvas, style: Style) -> String {
    let mut sgr = String::from("0");
    if style.bold {
        sgr.push_str(";1");
    }
    if style.dim {
        sgr.push_str(";2");
    }
    if style.reverse {
        sgr.push_str(";7");
    }
    if let Some((r, g, b)) = style.fg
        && canvas.color_mode != ColorMode::Mono
    {
        sgr.push(';');
        sgr.push_str(&color_to_fg(canvas.map_color(r, g, b)));
    }
    sgr
}

/// Render `text` with the canvas painted over it wherever the canvas is
/// visible and lit. Rows are addressed with absolute cursor moves, starting
/// from the cursor home position.
pub fn compose(canvas: &Canvas, text: &TextLayer) -> String {
    let cols = text.cols;
    let rows = text.rows;
    let overlay_at = match canvas.render_mode {
        RenderMode::Braille => braille::overlay,
        RenderMode::HalfBlock => halfblock::overlay,
    };

    let mut out = String::with_capacity(cols * rows * 8);
    let mut overlays: Vec<Option<Overlay>> = Vec::with_capacity(cols);

    for row in 0..rows {
        overlays.clear();
        overlays.extend((0..cols).map(|col| {
            if canvas.visible {
                overlay_at(canvas, col, row)
            } else {
                None
            }
        }));

        let mut last_sgr = String::new();
        for col in 0..cols {
            let (ch, sgr) = if let Some(o) = &overlays[col] {
                let sgr = if o.sgr.is_empty() {
                    "0".to_string()
                } else {
                    format!("0;{}", o.sgr)
                };
                (o.ch, sgr)
            } else {
                let cell = text.cell(col, row);
                if cell.ch == WIDE_TAIL {
                    let head_printed = col > 0
                        && overlays[col - 1].is_none()
                        && char_width(text.cell(col - 1, row).ch) == 2;
                    if head_printed {
                        // The terminal already advanced past this column.
                        continue;
                    }
                    (' ', text_sgr(canvas, cell.style))
                } else if char_width(cell.ch) == 2
                    && overlays.get(col + 1).is_none_or(|o| o.is_some())
                {
                    // Right half is covered by a spark; a wide glyph would shift the row.
                    (' ', text_sgr(canvas, cell.style))
                } else {
                    (cell.ch, text_sgr(canvas, cell.style))
                }
            };

            if sgr != last_sgr {
                out.push_str("\x1b[");
                out.push_str(&sgr);
                out.push('m');
                last_sgr = sgr;
            }
            out.push(ch);
        }
        out.push_str("\x1b[0m\x1b[");
        out.push_str(&(row + 2).to_string());
        out.push_str(";1H");
    }
    out
}
