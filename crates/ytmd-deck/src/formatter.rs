//! Display strings for the play/pause key and dial.
//!
//! Templates use `{name}` placeholders. Names match case-insensitively and a
//! template is scanned exactly once, so a value that itself looks like a
//! placeholder is written out verbatim. Unknown names stay in the output.

use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const DEFAULT_TIME_FORMAT: &str = "{current}";
pub const DEFAULT_TITLE_FORMAT: &str = "{title}";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z]+(?::[A-Za-z])?)\}").expect("placeholder pattern is valid")
    })
}

/// `MM:SS` below an hour, `H:MM:SS` above.
pub fn format_time(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();
    let hours = seconds / 3600;
    let minutes = (seconds / 60) % 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{sign}{minutes:02}:{secs:02}")
    }
}

/// Whole-second playback position of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeValues {
    pub current: i64,
    pub duration: i64,
    pub remaining: i64,
}

impl TimeValues {
    /// Truncates both inputs to whole seconds. A missing duration counts as 0.
    pub fn from_progress(progress: f64, duration: Option<f64>) -> Self {
        let current = truncate_seconds(progress);
        let duration = duration.map(truncate_seconds).unwrap_or(0);
        Self {
            current,
            duration,
            remaining: duration - current,
        }
    }

    /// Progress in percent for the dial indicator; 0 while the duration is unknown.
    pub fn percent(&self) -> f64 {
        if self.duration <= 0 {
            return 0.0;
        }
        self.current as f64 / self.duration as f64 * 100.0
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let (name, flavour) = match key.split_once(':') {
            Some((name, flavour)) => (name, Some(flavour)),
            None => (key, None),
        };
        let value = match name {
            "current" => self.current,
            "duration" => self.duration,
            "remaining" => self.remaining,
            _ => return None,
        };
        match flavour {
            None | Some("h") => Some(format_time(value)),
            Some("s") => Some(value.to_string()),
            Some(_) => None,
        }
    }
}

fn truncate_seconds(value: f64) -> i64 {
    if value.is_finite() {
        value.floor() as i64
    } else {
        0
    }
}

/// Raw track metadata fed into title templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackText {
    pub title: String,
    pub album: String,
    pub author: String,
}

impl TrackText {
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "title" => Some(self.title.clone()),
            "album" => Some(self.album.clone()),
            "author" => Some(self.author.clone()),
            _ => None,
        }
    }
}

/// First non-empty of the per-context override, the action default and the fallback.
pub fn resolve_template<'a>(
    context_override: Option<&'a str>,
    action_default: Option<&'a str>,
    fallback: &'a str,
) -> &'a str {
    context_override
        .filter(|t| !t.is_empty())
        .or_else(|| action_default.filter(|t| !t.is_empty()))
        .unwrap_or(fallback)
}

pub fn format_time_template(template: &str, values: &TimeValues) -> String {
    substitute(template, |key| values.lookup(key))
}

pub fn format_title_template(template: &str, track: &TrackText) -> String {
    substitute(template, |key| track.lookup(key))
}

fn substitute(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| {
            let key = caps[1].to_ascii_lowercase();
            lookup(&key).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
