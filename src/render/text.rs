/// Presentation of one text cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<(u8, u8, u8)>,
    pub bold: bool,
    pub dim: bool,
    pub reverse: bool,
}

impl Style {
    pub fn fg(r: u8, g: u8, b: u8) -> Self {
        Style {
            fg: Some((r, g, b)),
            ..Style::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// Continuation marker for the right half of a wide character.
pub const WIDE_TAIL: char = '\0';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}

/// Terminal columns taken by `c`: 0 for joiners and variation selectors,
/// 2 for emoji and CJK, 1 otherwise.
pub fn char_width(c: char) -> usize {
    match c as u32 {
        0x200B..=0x200D | 0xFE00..=0xFE0F | 0x0300..=0x036F => 0,
        0x1100..=0x115F
        | 0x231A..=0x231B
        | 0x23E9..=0x23EC
        | 0x23F0
        | 0x23F3
        | 0x2614..=0x2615
        | 0x26A1
        | 0x2705
        | 0x2B50
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x1F680..=0x1F6FF
        | 0x1F900..=0x1FAFF => 2,
        _ => 1,
    }
}

/// Display width of a whole string.
pub fn str_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Grid of styled characters the UI draws into each frame.
pub struct TextLayer {
    pub cols: usize,
    pub rows: usize,
    cells: Vec<Cell>,
}

impl TextLayer {
    pub fn new(cols: usize, rows: usize) -> Self {
        TextLayer {
            cols,
            rows,
            cells: vec![Cell::default(); cols * rows],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> Cell {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col]
        } else {
            Cell::default()
        }
    }

    /// Write `text` starting at (`col`, `row`), clipped at the right edge.
    /// Returns the column after the last character written.
    pub fn put_str(&mut self, col: usize, row: usize, text: &str, style: Style) -> usize {
        if row >= self.rows {
            return col;
        }
        let mut x = col;
        for ch in text.chars() {
            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            if x + w > self.cols {
                break;
            }
            let base = row * self.cols;
            self.cells[base + x] = Cell { ch, style };
            if w == 2 {
                self.cells[base + x + 1] = Cell { ch: WIDE_TAIL, style };
            }
            x += w;
        }
        x
    }

    /// Apply `style` to every cell of `row`.
    pub fn style_row(&mut self, row: usize, style: Style) {
        if row >= self.rows {
            return;
        }
        let base = row * self.cols;
        for cell in &mut self.cells[base..base + self.cols] {
            cell.style = style;
        }
    }
}
