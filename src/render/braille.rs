use super::canvas::{Canvas, ColorMode, color_to_fg};
use super::compose::Overlay;

/// Braille dot positions within a 2x4 cell:
/// (0,0) (1,0)    dot1 dot4
/// (0,1) (1,1)    dot2 dot5
/// (0,2) (1,2)    dot3 dot6
/// (0,3) (1,3)    dot7 dot8
///
/// Unicode braille: U+2800 + dot_bits
const BRAILLE_OFFSET: u32 = 0x2800;
const DOT_MAP: [(usize, usize, u32); 8] = [
    (0, 0, 0x01), // dot 1
    (0, 1, 0x02), // dot 2
    (0, 2, 0x04), // dot 3
    (1, 0, 0x08), // dot 4
    (1, 1, 0x10), // dot 5
    (1, 2, 0x20), // dot 6
    (0, 3, 0x40), // dot 7
    (1, 3, 0x80), // dot 8
];

/// Coverage a dot needs before it is raised.
const THRESHOLD: f64 = 0.3;

/// Braille glyph for the canvas pixels under cell (`col`, `row`), or `None`
/// when no dot is raised and the text underneath should show.
pub fn overlay(canvas: &Canvas, col: usize, row: usize) -> Option<Overlay> {
    let px = col * 2;
    let py = row * 4;

    let mut bits: u32 = 0;
    let mut total = [0.0f64; 3];
    let mut total_v = 0.0;
    let mut lit_count: u32 = 0;

    for &(dx, dy, bit) in &DOT_MAP {
        let (v, (r, g, b)) = canvas.pixel(px + dx, py + dy);
        if v > THRESHOLD {
            bits |= bit;
            total[0] += r as f64;
            total[1] += g as f64;
            total[2] += b as f64;
            total_v += v;
            lit_count += 1;
        }
    }

    if bits == 0 {
        return None;
    }
    let ch = char::from_u32(BRAILLE_OFFSET + bits).unwrap_or(' ');

    if canvas.color_mode == ColorMode::Mono {
        return Some(Overlay::plain(ch));
    }
    // Average color, dimmed by the average coverage so sparks fade out.
    let n = lit_count as f64;
    let fade = (total_v / n).clamp(0.0, 1.0);
    let channel = |t: f64| (t / n * fade).round().clamp(0.0, 255.0) as u8;
    let color = canvas.map_color(channel(total[0]), channel(total[1]), channel(total[2]));
    Some(Overlay {
        ch,
        sgr: color_to_fg(color),
    })
}
