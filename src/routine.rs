use serde::Deserialize;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Minutes in a day; the last activity runs until midnight.
const END_OF_DAY: u32 = 24 * 60;

#[derive(Debug, Error)]
pub enum RoutineError {
    #[error("failed to read routine {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid routine JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One scheduled activity, e.g. `{"time": "7:05 AM", "icon": "🪥", "activity": "Brush teeth"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoutineItem {
    pub time: String,
    #[serde(default)]
    pub icon: String,
    pub activity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Routine {
    #[serde(rename = "morningRoutine")]
    pub items: Vec<RoutineItem>,
}

/// Where an item sits relative to the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Past,
    Current,
    Future,
}

impl Routine {
    pub fn load(path: &Path) -> Result<Self, RoutineError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RoutineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let routine = Self::from_json(&contents).map_err(|source| RoutineError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), items = routine.items.len(), "routine loaded");
        Ok(routine)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Routine shown when no file is configured.
    pub fn builtin() -> Self {
        let item = |time: &str, icon: &str, activity: &str| RoutineItem {
            time: time.to_string(),
            icon: icon.to_string(),
            activity: activity.to_string(),
        };
        Routine {
            items: vec![
                item("6:45 AM", "⏰", "Wake up"),
                item("6:50 AM", "🚿", "Shower"),
                item("7:05 AM", "👕", "Get dressed"),
                item("7:15 AM", "🥣", "Breakfast"),
                item("7:35 AM", "🪥", "Brush teeth"),
                item("7:40 AM", "🎒", "Pack bag"),
                item("7:50 AM", "👟", "Shoes on and out the door"),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Start of item `i` and start of the next one (midnight for the last).
    fn span(&self, i: usize) -> (u32, u32) {
        let start = parse_clock_time(&self.items[i].time);
        let end = self
            .items
            .get(i + 1)
            .map_or(END_OF_DAY, |next| parse_clock_time(&next.time));
        (start, end)
    }

    /// First item whose span contains `now` (minutes since midnight).
    pub fn current_index(&self, now: u32) -> Option<usize> {
        (0..self.items.len()).find(|&i| {
            let (start, end) = self.span(i);
            now >= start && now < end
        })
    }

    /// Slot of every item at `now`.
    pub fn schedule(&self, now: u32) -> Vec<Slot> {
        let current = self.current_index(now);
        (0..self.items.len())
            .map(|i| {
                let (_, end) = self.span(i);
                if Some(i) == current {
                    Slot::Current
                } else if now >= end {
                    Slot::Past
                } else {
                    Slot::Future
                }
            })
            .collect()
    }
}

/// `7:05 AM`, anywhere in the text, AM/PM in any case.
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+):([0-9]+)\s*(AM|PM)").expect("clock time pattern is valid")
});

/// Minutes since midnight for a time like `"7:05 AM"` or `"12:30pm"`.
/// Anything unparseable counts as midnight.
pub fn parse_clock_time(text: &str) -> u32 {
    try_parse_clock_time(text).unwrap_or(0)
}

/// Like [`parse_clock_time`], but `None` when no time is found or the
/// numbers do not fit.
pub fn try_parse_clock_time(text: &str) -> Option<u32> {
    let caps = CLOCK_TIME.captures(text)?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;

    let hours = if caps[3].eq_ignore_ascii_case("am") {
        if hours == 12 { 0 } else { hours }
    } else if hours == 12 {
        12
    } else {
        hours.checked_add(12)?
    };
    hours.checked_mul(60)?.checked_add(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "morningRoutine": [
            {"time": "7:00 AM", "icon": "⏰", "activity": "Wake up"},
            {"time": "7:10 AM", "icon": "🥣", "activity": "Breakfast"},
            {"time": "7:30 AM", "activity": "Leave"}
        ]
    }"#;

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(parse_clock_time("7:05 AM"), 7 * 60 + 5);
        assert_eq!(parse_clock_time("7:05am"), 7 * 60 + 5);
        assert_eq!(parse_clock_time("12:15 AM"), 15);
        assert_eq!(parse_clock_time("12:15 PM"), 12 * 60 + 15);
        assert_eq!(parse_clock_time("1:00 pm"), 13 * 60);
        assert_eq!(parse_clock_time("at 6:30  AM sharp"), 6 * 60 + 30);
    }

    #[test]
    fn test_labelled_time_finds_first_match() {
        assert_eq!(parse_clock_time("Leave by: 7:05 AM"), 7 * 60 + 5);
        // "12:34" is not followed by AM/PM, so the match is "34:56 PM".
        assert_eq!(parse_clock_time("12:34:56 PM"), (34 + 12) * 60 + 56);
    }

    #[test]
    fn test_huge_numbers_fall_back_to_midnight() {
        assert_eq!(parse_clock_time("4294967295:00 PM"), 0);
        assert_eq!(parse_clock_time("99999999:00 AM"), 0);
        assert_eq!(parse_clock_time("7:99999999999 AM"), 0);
        assert_eq!(try_parse_clock_time("4294967283:00 PM"), None);
        assert_eq!(try_parse_clock_time("71582788:15 AM"), Some(71582788 * 60 + 15));
    }

    #[test]
    fn test_unparseable_time_is_midnight() {
        assert_eq!(parse_clock_time("soon"), 0);
        assert_eq!(parse_clock_time("7:05"), 0);
        assert_eq!(parse_clock_time(":05 AM"), 0);
    }

    #[test]
    fn test_from_json_defaults_icon() {
        let routine = Routine::from_json(SAMPLE).unwrap();
        assert_eq!(routine.len(), 3);
        assert_eq!(routine.items[1].icon, "🥣");
        assert_eq!(routine.items[2].icon, "");
    }

    #[test]
    fn test_schedule_slots() {
        let routine = Routine::from_json(SAMPLE).unwrap();
        use Slot::*;
        assert_eq!(routine.schedule(6 * 60), vec![Future, Future, Future]);
        assert_eq!(routine.schedule(7 * 60), vec![Current, Future, Future]);
        assert_eq!(routine.schedule(7 * 60 + 15), vec![Past, Current, Future]);
        assert_eq!(routine.schedule(23 * 60), vec![Past, Past, Current]);
        assert_eq!(routine.current_index(6 * 60), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let routine = Routine::load(file.path()).unwrap();
        assert_eq!(routine.items[0].activity, "Wake up");
    }

    #[test]
    fn test_load_errors_carry_path() {
        let missing = Routine::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(missing, RoutineError::Io { .. }));
        assert!(missing.to_string().contains("/definitely/not/here.json"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"morningRoutine\": 3}").unwrap();
        let bad = Routine::load(file.path()).unwrap_err();
        assert!(matches!(bad, RoutineError::Parse { .. }));
    }

    #[test]
    fn test_builtin_is_ordered() {
        let routine = Routine::builtin();
        let times: Vec<u32> = routine.items.iter().map(|i| parse_clock_time(&i.time)).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }
}
