/// 2-D paintable area the animator draws onto.
pub trait Surface {
    /// Size in pixels.
    fn dimensions(&self) -> (usize, usize);

    /// Resize so the surface covers a viewport of `cols` x `rows` terminal cells.
    fn fit_viewport(&mut self, cols: usize, rows: usize);

    fn clear(&mut self);

    /// Paint a filled circle with `color` at opacity `alpha`.
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: (u8, u8, u8), alpha: f64);

    fn set_visible(&mut self, visible: bool);
}

/// Hue/saturation/lightness colour. Hue in degrees, the rest in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn new(h: f64, s: f64, l: f64) -> Self {
        Hsl { h, s, l }
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = self.h.rem_euclid(360.0);
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = l - c / 2.0;

        let (r1, g1, b1) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        (
            ((r1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((g1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((b1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        )
    }
}
