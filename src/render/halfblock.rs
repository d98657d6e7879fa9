use super::canvas::{Canvas, ColorMode, color_to_bg, color_to_fg};
use super::compose::Overlay;

/// Pixel coverage below which a half-block pixel is treated as empty.
/// Much lower than the braille threshold: half-block renders the coverage
/// through color scaling, so faint pixels still read as a dim glow.
const DARK_THRESHOLD: f64 = 0.02;

/// Half-block glyph for the two canvas pixels under cell (`col`, `row`), or
/// `None` when both are dark.
pub fn overlay(canvas: &Canvas, col: usize, row: usize) -> Option<Overlay> {
    let (top_v, top_c) = canvas.pixel(col, row * 2);
    let (bot_v, bot_c) = canvas.pixel(col, row * 2 + 1);

    let top_lit = top_v >= DARK_THRESHOLD;
    let bot_lit = bot_v >= DARK_THRESHOLD;

    if canvas.color_mode == ColorMode::Mono {
        return match (top_lit, bot_lit) {
            (true, true) => Some(Overlay::plain('█')),
            (true, false) => Some(Overlay::plain('▀')),
            (false, true) => Some(Overlay::plain('▄')),
            (false, false) => None,
        };
    }

    let scale = |c: u8, v: f64| -> u8 { (c as f64 * v.clamp(0.0, 1.0)) as u8 };
    let shade = |(r, g, b): (u8, u8, u8), v: f64| canvas.map_color(scale(r, v), scale(g, v), scale(b, v));

    match (top_lit, bot_lit) {
        (true, true) => Some(Overlay {
            ch: '▀',
            sgr: format!(
                "{};{}",
                color_to_fg(shade(top_c, top_v)),
                color_to_bg(shade(bot_c, bot_v))
            ),
        }),
        (true, false) => Some(Overlay {
            ch: '▀',
            sgr: color_to_fg(shade(top_c, top_v)),
        }),
        (false, true) => Some(Overlay {
            ch: '▄',
            sgr: color_to_fg(shade(bot_c, bot_v)),
        }),
        (false, false) => None,
    }
}
