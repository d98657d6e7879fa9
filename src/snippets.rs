use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use thiserror::Error;

const JOKE_URL: &str = "https://icanhazdadjoke.com/";
const TRIVIA_URL: &str = "https://opentdb.com/api.php?amount=1&category=9&difficulty=easy";
const USER_AGENT: &str = concat!("daybreak/", env!("CARGO_PKG_VERSION"));

pub const JOKE_LOADING: &str = "Loading joke...";
pub const JOKE_FAILED: &str = "Could not load joke. Try again later!";
pub const TRIVIA_LOADING: &str = "Loading trivia...";
pub const TRIVIA_FAILED: &str = "Could not load trivia. Try again later!";

#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("http error: {0}")]
    Http(String),
    #[error("json error: {0}")]
    Json(String),
    #[error("no trivia question in response")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trivia {
    pub question: String,
    pub answer: String,
}

/// A finished fetch, sent back to the run loop.
#[derive(Debug)]
pub enum Fetched {
    Joke(Result<String, SnippetError>),
    Trivia(Result<Trivia, SnippetError>),
}

#[derive(Deserialize)]
struct JokeWire {
    joke: String,
}

#[derive(Deserialize)]
struct TriviaWire {
    #[serde(default)]
    results: Vec<TriviaQuestionWire>,
}

#[derive(Deserialize)]
struct TriviaQuestionWire {
    question: String,
    correct_answer: String,
}

fn http_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(10))
        .timeout_read(Duration::from_secs(20))
        .build()
}

fn get_json(agent: &ureq::Agent, url: &str) -> Result<String, SnippetError> {
    agent
        .get(url)
        .set("Accept", "application/json")
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| SnippetError::Http(e.to_string()))?
        .into_string()
        .map_err(|e| SnippetError::Http(e.to_string()))
}

pub fn parse_joke(body: &str) -> Result<String, SnippetError> {
    let wire: JokeWire = serde_json::from_str(body).map_err(|e| SnippetError::Json(e.to_string()))?;
    Ok(wire.joke)
}

pub fn parse_trivia(body: &str) -> Result<Trivia, SnippetError> {
    let wire: TriviaWire =
        serde_json::from_str(body).map_err(|e| SnippetError::Json(e.to_string()))?;
    let first = wire.results.into_iter().next().ok_or(SnippetError::Empty)?;
    Ok(Trivia {
        question: decode_entities(&first.question),
        answer: decode_entities(&first.correct_answer),
    })
}

pub fn fetch_joke(agent: &ureq::Agent) -> Result<String, SnippetError> {
    parse_joke(&get_json(agent, JOKE_URL)?)
}

pub fn fetch_trivia(agent: &ureq::Agent) -> Result<Trivia, SnippetError> {
    parse_trivia(&get_json(agent, TRIVIA_URL)?)
}

/// Fetch a joke and a trivia question on a background thread.
pub fn spawn_fetch() -> Receiver<Fetched> {
    let (tx, rx) = mpsc::channel::<Fetched>();
    std::thread::spawn(move || fetch_all(&tx));
    rx
}

fn fetch_all(tx: &Sender<Fetched>) {
    let agent = http_agent();
    if tx.send(Fetched::Joke(fetch_joke(&agent))).is_err() {
        return;
    }
    let _ = tx.send(Fetched::Trivia(fetch_trivia(&agent)));
}

/// Decode the HTML entities the trivia API embeds in its text.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "eacute" => 'é',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "shy" => '\u{ad}',
        "rsquo" => '’',
        "lsquo" => '‘',
        "ldquo" => '“',
        "rdquo" => '”',
        "hellip" => '…',
        _ => return None,
    })
}

/// Minutes since midnight when the trivia answer appears by default, 7:20 AM.
pub const DEFAULT_REVEAL: u32 = 7 * 60 + 20;

/// Reveal time from a setting like `"7:20 AM"`. A setting that does not
/// parse is logged and replaced by the default.
pub fn reveal_minutes(setting: Option<&str>) -> u32 {
    let Some(text) = setting else {
        return DEFAULT_REVEAL;
    };
    crate::routine::try_parse_clock_time(text).unwrap_or_else(|| {
        tracing::warn!(trivia_reveal = text, "unrecognised reveal time, using 7:20 AM");
        DEFAULT_REVEAL
    })
}

/// What the board shows for the joke and trivia panels.
#[derive(Debug, Clone)]
pub struct Snippets {
    pub joke: String,
    pub question: String,
    answer: Option<String>,
}

impl Default for Snippets {
    fn default() -> Self {
        Snippets {
            joke: JOKE_LOADING.to_string(),
            question: TRIVIA_LOADING.to_string(),
            answer: None,
        }
    }
}

impl Snippets {
    pub fn apply(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Joke(Ok(joke)) => {
                tracing::debug!("joke loaded");
                self.joke = joke;
            }
            Fetched::Joke(Err(e)) => {
                tracing::warn!(error = %e, "joke fetch failed");
                self.joke = JOKE_FAILED.to_string();
            }
            Fetched::Trivia(Ok(trivia)) => {
                tracing::debug!("trivia loaded");
                self.question = trivia.question;
                self.answer = Some(trivia.answer).filter(|a| !a.is_empty());
            }
            Fetched::Trivia(Err(e)) => {
                tracing::warn!(error = %e, "trivia fetch failed");
                self.question = TRIVIA_FAILED.to_string();
                self.answer = None;
            }
        }
    }

    /// `Answer: ...` once `now` reaches `reveal_at` (minutes since midnight).
    pub fn answer_line(&self, now: u32, reveal_at: u32) -> Option<String> {
        if now < reveal_at {
            return None;
        }
        self.answer.as_ref().map(|a| format!("Answer: {a}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_minutes_falls_back_to_default() {
        assert_eq!(reveal_minutes(None), DEFAULT_REVEAL);
        assert_eq!(reveal_minutes(Some("7:45 AM")), 7 * 60 + 45);
        assert_eq!(reveal_minutes(Some("after breakfast")), DEFAULT_REVEAL);
        assert_eq!(reveal_minutes(Some("19:20")), DEFAULT_REVEAL);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_entities("Which &quot;planet&quot; isn&#039;t a &lt;star&gt;?"),
            "Which \"planet\" isn't a <star>?"
        );
        assert_eq!(decode_entities("Caf&eacute; &amp; &#x263A;"), "Café & ☺");
        assert_eq!(decode_entities("AT&T; 5 & 6"), "AT&T; 5 & 6");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn test_parse_joke() {
        let joke = parse_joke(r#"{"id":"x","joke":"I'm reading a book on anti-gravity.","status":200}"#)
            .unwrap();
        assert_eq!(joke, "I'm reading a book on anti-gravity.");
        assert!(matches!(parse_joke("<html>"), Err(SnippetError::Json(_))));
    }

    #[test]
    fn test_parse_trivia_decodes() {
        let body = r#"{"response_code":0,"results":[{"type":"multiple","question":"What&#039;s 2+2?","correct_answer":"&quot;4&quot;","incorrect_answers":["3"]}]}"#;
        let trivia = parse_trivia(body).unwrap();
        assert_eq!(trivia.question, "What's 2+2?");
        assert_eq!(trivia.answer, "\"4\"");
        assert!(matches!(
            parse_trivia(r#"{"response_code":1,"results":[]}"#),
            Err(SnippetError::Empty)
        ));
    }

    #[test]
    fn test_answer_revealed_after_time() {
        let mut snippets = Snippets::default();
        assert_eq!(snippets.answer_line(8 * 60, 440), None);

        snippets.apply(Fetched::Trivia(Ok(Trivia {
            question: "Q".into(),
            answer: "A".into(),
        })));
        assert_eq!(snippets.answer_line(439, 440), None);
        assert_eq!(snippets.answer_line(440, 440), Some("Answer: A".to_string()));
    }

    #[test]
    fn test_failures_show_fallback_text() {
        let mut snippets = Snippets::default();
        snippets.apply(Fetched::Joke(Err(SnippetError::Http("offline".into()))));
        snippets.apply(Fetched::Trivia(Err(SnippetError::Empty)));
        assert_eq!(snippets.joke, JOKE_FAILED);
        assert_eq!(snippets.question, TRIVIA_FAILED);
        assert_eq!(snippets.answer_line(23 * 60, 0), None);
    }
}
