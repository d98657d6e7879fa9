use crate::fireworks::Surface;
use crossterm::style::Color;

/// How to render sub-cell pixels to terminal characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderMode {
    /// Unicode braille characters (2x4 per cell = highest resolution)
    Braille,
    /// Half-block characters ▀▄█ (1x2 per cell)
    HalfBlock,
}

impl RenderMode {
    /// Pixels per terminal cell, horizontally and vertically.
    pub fn cell_pixels(self) -> (usize, usize) {
        match self {
            RenderMode::Braille => (2, 4),
            RenderMode::HalfBlock => (1, 2),
        }
    }
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// No color, monochrome
    Mono,
    /// ANSI 16 colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit true color (RGB)
    TrueColor,
}

/// Pixel canvas the fireworks paint onto, overlaid on the text layer.
/// Coordinates are in "sub-cell" pixel space.
pub struct Canvas {
    /// Width in pixels (sub-cell)
    pub width: usize,
    /// Height in pixels (sub-cell)
    pub height: usize,
    /// Pixel coverage: 0.0..=1.0
    pub pixels: Vec<f64>,
    /// Per-pixel color
    pub colors: Vec<(u8, u8, u8)>,
    pub render_mode: RenderMode,
    pub color_mode: ColorMode,
    /// Color quantization step (0 = off, 4/8/16 = round RGB to nearest N).
    pub color_quant: u8,
    /// Only a visible canvas is composited over the text.
    pub visible: bool,
    cols: usize,
    rows: usize,
}

impl Canvas {
    pub fn new(
        term_cols: usize,
        term_rows: usize,
        render_mode: RenderMode,
        color_mode: ColorMode,
    ) -> Self {
        let mut canvas = Canvas {
            width: 0,
            height: 0,
            pixels: Vec::new(),
            colors: Vec::new(),
            render_mode,
            color_mode,
            color_quant: 0,
            visible: false,
            cols: 0,
            rows: 0,
        };
        canvas.resize_cells(term_cols, term_rows);
        canvas
    }

    fn resize_cells(&mut self, term_cols: usize, term_rows: usize) {
        let (cw, ch) = self.render_mode.cell_pixels();
        self.cols = term_cols;
        self.rows = term_rows;
        self.width = term_cols * cw;
        self.height = term_rows * ch;
        let size = self.width * self.height;
        self.pixels = vec![0.0; size];
        self.colors = vec![(0, 0, 0); size];
    }

    /// Switch pixel density, keeping the same terminal footprint.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode != self.render_mode {
            self.render_mode = mode;
            self.resize_cells(self.cols, self.rows);
        }
    }

    /// Terminal dimensions covered by this canvas
    pub fn term_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Coverage and color of a pixel; out-of-range reads as empty.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> (f64, (u8, u8, u8)) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            (self.pixels[idx], self.colors[idx])
        } else {
            (0.0, (0, 0, 0))
        }
    }

    /// Composite `color` over the pixel at opacity `alpha`.
    #[inline]
    fn blend(&mut self, x: usize, y: usize, color: (u8, u8, u8), alpha: f64) {
        let idx = y * self.width + x;
        let dst = self.pixels[idx];
        let out = alpha + dst * (1.0 - alpha);
        if out <= 0.0 {
            return;
        }
        let (dr, dg, db) = self.colors[idx];
        let mix = |s: u8, d: u8| -> u8 {
            ((s as f64 * alpha + d as f64 * dst * (1.0 - alpha)) / out)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        self.pixels[idx] = out;
        self.colors[idx] = (mix(color.0, dr), mix(color.1, dg), mix(color.2, db));
    }

    pub fn map_color(&self, r: u8, g: u8, b: u8) -> Color {
        // Apply color quantization if enabled (reduces unique colors for better dedup)
        let (r, g, b) = if self.color_quant > 1 {
            let q = self.color_quant as u16;
            (
                ((r as u16 + q / 2) / q * q).min(255) as u8,
                ((g as u16 + q / 2) / q * q).min(255) as u8,
                ((b as u16 + q / 2) / q * q).min(255) as u8,
            )
        } else {
            (r, g, b)
        };
        match self.color_mode {
            ColorMode::Mono => Color::White,
            ColorMode::TrueColor => Color::Rgb { r, g, b },
            ColorMode::Ansi256 => {
                let idx = 16 + (36 * (r as u16 / 51)) + (6 * (g as u16 / 51)) + (b as u16 / 51);
                Color::AnsiValue(idx as u8)
            }
            ColorMode::Ansi16 => {
                let brightness = (r as u16 + g as u16 + b as u16) / 3;
                if brightness < 64 {
                    Color::DarkGrey
                } else if r > g && r > b {
                    if brightness > 180 { Color::Red } else { Color::DarkRed }
                } else if g > r && g > b {
                    if brightness > 180 { Color::Green } else { Color::DarkGreen }
                } else if b > r && b > g {
                    if brightness > 180 { Color::Blue } else { Color::DarkBlue }
                } else if r == g && r > b {
                    if brightness > 180 { Color::Yellow } else { Color::DarkYellow }
                } else if brightness > 180 {
                    Color::White
                } else {
                    Color::Grey
                }
            }
        }
    }

    /// Render the text layer with this canvas composited on top.
    pub fn compose(&self, text: &super::TextLayer) -> String {
        super::compose::compose(self, text)
    }
}

impl Surface for Canvas {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn fit_viewport(&mut self, cols: usize, rows: usize) {
        if (cols, rows) != (self.cols, self.rows) {
            self.resize_cells(cols, rows);
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(0.0);
        self.colors.fill((0, 0, 0));
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: (u8, u8, u8), alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 || radius <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        if x + radius < 0.0 || y + radius < 0.0 {
            return;
        }
        let x0 = (x - radius).floor().max(0.0) as usize;
        let y0 = (y - radius).floor().max(0.0) as usize;
        let x1 = ((x + radius).ceil() as usize).min(self.width - 1);
        let y1 = ((y + radius).ceil() as usize).min(self.height - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }

        let r2 = radius * radius;
        for py in y0..=y1 {
            let dy = py as f64 + 0.5 - y;
            for px in x0..=x1 {
                let dx = px as f64 + 0.5 - x;
                if dx * dx + dy * dy <= r2 {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

pub fn color_to_fg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("38;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("38;5;{}", v),
        Color::Black => "30".into(),
        Color::DarkRed => "31".into(),
        Color::DarkGreen => "32".into(),
        Color::DarkYellow => "33".into(),
        Color::DarkBlue => "34".into(),
        Color::DarkMagenta => "35".into(),
        Color::DarkCyan => "36".into(),
        Color::Grey => "37".into(),
        Color::DarkGrey => "90".into(),
        Color::Red => "91".into(),
        Color::Green => "92".into(),
        Color::Yellow => "93".into(),
        Color::Blue => "94".into(),
        Color::Magenta => "95".into(),
        Color::Cyan => "96".into(),
        Color::White => "97".into(),
        _ => "37".into(),
    }
}

pub fn color_to_bg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("48;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("48;5;{}", v),
        Color::Black => "40".into(),
        Color::DarkRed => "41".into(),
        Color::DarkGreen => "42".into(),
        Color::DarkYellow => "43".into(),
        Color::DarkBlue => "44".into(),
        Color::DarkMagenta => "45".into(),
        Color::DarkCyan => "46".into(),
        Color::Grey => "47".into(),
        Color::DarkGrey => "100".into(),
        Color::Red => "101".into(),
        Color::Green => "102".into(),
        Color::Yellow => "103".into(),
        Color::Blue => "104".into(),
        Color::Magenta => "105".into(),
        Color::Cyan => "106".into(),
        Color::White => "107".into(),
        _ => "40".into(),
    }
}
