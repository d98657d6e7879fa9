use crate::app::App;
use crate::render::text::{char_width, str_width};
use crate::render::{Style, TextLayer};
use crate::routine::Slot;

const TITLE: (u8, u8, u8) = (255, 196, 92);
const CLOCK: (u8, u8, u8) = (255, 236, 179);
const JOKE: (u8, u8, u8) = (120, 200, 255);
const TRIVIA: (u8, u8, u8) = (190, 150, 255);
const ANSWER: (u8, u8, u8) = (130, 220, 130);
const NOTICE: (u8, u8, u8) = (255, 170, 120);

const MARGIN: usize = 2;

/// Status bar contents; `None` hides it.
pub struct Status<'a> {
    pub render: &'a str,
    pub color: &'a str,
    pub fps: f64,
}

/// Lay out the whole board into `layer`.
pub fn draw(layer: &mut TextLayer, app: &App, status: Option<&Status>) {
    layer.clear();
    let cols = layer.cols;
    let body_rows = if status.is_some() {
        layer.rows.saturating_sub(1)
    } else {
        layer.rows
    };
    let width = cols.saturating_sub(MARGIN * 2);
    let now = app.clock.minutes_since_midnight();

    // Header
    let (r, g, b) = TITLE;
    layer.put_str(MARGIN, 0, "Morning Routine", Style::fg(r, g, b).bold());
    let clock = if app.clock.is_offset() {
        format!("{} (preview)", app.clock.display())
    } else {
        app.clock.display()
    };
    let clock_col = cols.saturating_sub(str_width(&clock) + MARGIN);
    let (r, g, b) = CLOCK;
    layer.put_str(clock_col, 0, &clock, Style::fg(r, g, b).bold());

    let mut row = 2;

    // Routine
    if let Some(err) = &app.routine_error
        && app.routine.is_empty()
    {
        let (r, g, b) = NOTICE;
        layer.put_str(MARGIN, row, "Error loading routine", Style::fg(r, g, b).bold());
        row += 1;
        for line in wrap(err, width) {
            layer.put_str(MARGIN, row, &line, Style::default().dim());
            row += 1;
        }
    }
    let slots = app.routine.schedule(now);
    for (i, (item, slot)) in app.routine.items.iter().zip(&slots).enumerate() {
        if row >= body_rows {
            break;
        }
        let pointer = if i == app.checklist.cursor() { "▶" } else { " " };
        let check = if app.checklist.is_checked(i) { "[x]" } else { "[ ]" };
        let done = if *slot == Slot::Past { "✓ " } else { "  " };
        let line = format!("{pointer} {check} {done}{:>8}  {} {}", item.time, item.icon, item.activity);
        let style = match slot {
            Slot::Current => Style::default().bold().reverse(),
            Slot::Past => Style::default().dim(),
            Slot::Future => Style::default(),
        };
        if *slot == Slot::Current {
            layer.style_row(row, style);
        }
        layer.put_str(MARGIN, row, &line, style);
        row += 1;
    }
    if app.is_complete() {
        row += 1;
        let (r, g, b) = TITLE;
        layer.put_str(MARGIN, row, "All done! Have a great day! 🎉", Style::fg(r, g, b).bold());
        row += 1;
    }

    // Snippets
    if let Some(snippets) = &app.snippets {
        row += 1;
        let (r, g, b) = JOKE;
        layer.put_str(MARGIN, row, "Joke of the day", Style::fg(r, g, b).bold());
        row += 1;
        for line in wrap(&snippets.joke, width) {
            layer.put_str(MARGIN, row, &line, Style::default());
            row += 1;
        }

        row += 1;
        let (r, g, b) = TRIVIA;
        layer.put_str(MARGIN, row, "Trivia", Style::fg(r, g, b).bold());
        row += 1;
        for line in wrap(&snippets.question, width) {
            layer.put_str(MARGIN, row, &line, Style::default());
            row += 1;
        }
        if let Some(answer) = snippets.answer_line(now, app.trivia_reveal) {
            let (r, g, b) = ANSWER;
            for line in wrap(&answer, width) {
                layer.put_str(MARGIN, row, &line, Style::fg(r, g, b));
                row += 1;
            }
        }
    }

    // Prompt and notices sit just above the status bar.
    let footer = body_rows.saturating_sub(1);
    if let Some(input) = &app.input {
        let prompt = format!("Set time (HH:MM:SS): {input}_");
        layer.put_str(MARGIN, footer, &prompt, Style::default().bold());
    } else if let Some(notice) = &app.notice {
        let (r, g, b) = NOTICE;
        layer.put_str(MARGIN, footer, notice, Style::fg(r, g, b));
    }

    if let Some(status) = status {
        let bar_row = layer.rows.saturating_sub(1);
        let text = format!(
            " {}/{} done | {} | {} | {:.0} fps | [↑/↓] move  [space] check  [t] time  [0] now  [n] refresh  [r] render  [c] color  [h] hide  [q] quit ",
            app.checklist.checked_count(),
            app.checklist.len(),
            status.render,
            status.color,
            status.fps,
        );
        let bar = Style::default().reverse();
        layer.put_str(0, bar_row, &" ".repeat(cols), bar);
        layer.put_str(0, bar_row, &text, bar);
    }
}

/// Word-wrap `text` to `width` columns. Words wider than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let word_width = str_width(word);
        if line_width > 0 && line_width + 1 + word_width <= width {
            line.push(' ');
            line.push_str(word);
            line_width += 1 + word_width;
            continue;
        }
        if line_width > 0 {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        if word_width <= width {
            line.push_str(word);
            line_width = word_width;
            continue;
        }
        for ch in word.chars() {
            let w = char_width(ch);
            if line_width + w > width {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(ch);
            line_width += w;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::routine::Routine;

    fn row_text(layer: &TextLayer, row: usize) -> String {
        (0..layer.cols)
            .map(|c| layer.cell(c, row).ch)
            .filter(|&c| c != crate::render::text::WIDE_TAIL)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("the quick brown fox", 10), vec!["the quick", "brown fox"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("  ", 4), Vec::<String>::new());
        assert!(wrap("anything", 0).is_empty());
    }

    #[test]
    fn test_draw_lists_items_and_status() {
        let mut app = App::new(Ok(Routine::builtin()), Clock::new(), false, 0);
        app.checklist.toggle();
        let mut layer = TextLayer::new(100, 20);
        let status = Status {
            render: "Braille",
            color: "TrueColor",
            fps: 30.0,
        };
        draw(&mut layer, &app, Some(&status));

        assert!(row_text(&layer, 0).contains("Morning Routine"));
        let first = row_text(&layer, 2);
        assert!(first.contains("▶ [x]"));
        assert!(first.contains("6:45 AM"));
        assert!(first.contains("Wake up"));
        assert!(row_text(&layer, 3).contains("[ ]"));
        assert!(row_text(&layer, 19).starts_with(" 1/7 done | Braille | TrueColor | 30 fps"));
        assert!(layer.cell(99, 19).style.reverse);
    }

    #[test]
    fn test_draw_shows_error_and_prompt() {
        let missing = Routine::load(std::path::Path::new("/no/such/routine.json"));
        let mut app = App::new(missing, Clock::new(), false, 0);
        app.input = Some("07:1".to_string());
        let mut layer = TextLayer::new(60, 12);
        draw(&mut layer, &app, None);
        assert_eq!(row_text(&layer, 2), "  Error loading routine");
        assert_eq!(row_text(&layer, 11), "  Set time (HH:MM:SS): 07:1_");
    }

    #[test]
    fn test_draw_celebrates_completion() {
        let mut app = App::new(Ok(Routine::builtin()), Clock::new(), false, 0);
        for _ in 0..app.routine.len() {
            app.checklist.toggle();
            app.checklist.move_down();
        }
        let mut layer = TextLayer::new(80, 20);
        draw(&mut layer, &app, None);
        assert!((0..20).any(|r| row_text(&layer, r).contains("All done!")));
    }
}
