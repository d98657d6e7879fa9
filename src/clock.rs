use chrono::{DateTime, Local, NaiveTime, TimeDelta, Timelike};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("expected HH:MM:SS, got {0:?}")]
    InvalidTime(String),
}

/// Wall clock with an adjustable offset, so the board can be previewed at
/// any time of day.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    offset: TimeDelta,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> TimeDelta {
        self.offset
    }

    pub fn is_offset(&self) -> bool {
        !self.offset.is_zero()
    }

    pub fn now(&self) -> DateTime<Local> {
        Local::now() + self.offset
    }

    /// Current time as `HH:MM:SS`.
    pub fn display(&self) -> String {
        format_hms(&self.now())
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        minutes_of(&self.now())
    }

    /// Pretend it is `input` (`HH:MM:SS`) today. Leaves the offset untouched
    /// on invalid input.
    pub fn set_custom_time(&mut self, input: &str) -> Result<(), ClockError> {
        let target = parse_hms(input)?;
        self.offset = offset_between(target, Local::now().time());
        tracing::info!(time = input, offset_ms = self.offset.num_milliseconds(), "custom time set");
        Ok(())
    }

    pub fn reset(&mut self) {
        self.offset = TimeDelta::zero();
    }
}

/// Parse `H:MM:SS` / `HH:MM:SS` (24 h).
pub fn parse_hms(input: &str) -> Result<NaiveTime, ClockError> {
    let invalid = || ClockError::InvalidTime(input.to_string());

    let mut parts = input.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let digits = |p: &str, min_len: usize, max_len: usize| {
        (min_len..=max_len).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(h, 1, 2) || !digits(m, 2, 2) || !digits(s, 2, 2) {
        return Err(invalid());
    }
    let (h, m, s) = (
        h.parse().map_err(|_| invalid())?,
        m.parse().map_err(|_| invalid())?,
        s.parse().map_err(|_| invalid())?,
    );
    NaiveTime::from_hms_opt(h, m, s).ok_or_else(invalid)
}

/// Offset that turns `real` into `target`, sub-second part included.
fn offset_between(target: NaiveTime, real: NaiveTime) -> TimeDelta {
    target - real
}

pub fn format_hms<T: Timelike>(t: &T) -> String {
    format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())
}

pub fn minutes_of<T: Timelike>(t: &T) -> u32 {
    t.hour() * 60 + t.minute()
}
