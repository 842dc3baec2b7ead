//! Key/value extraction from single lines or file paths.
//!
//! An extraction pattern is literal text with `%slot%` placeholders, e.g.
//! `%artist% - %title%`. Matching is a single left-to-right scan: each
//! literal is searched for after the previous one, and the text skipped over
//! is assigned to the slot in between. A slot may appear more than once, in
//! which case every capture must agree (see [`normalize`]).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

const SLOT_SIGN: char = '%';

/// What [`KeyValueExtractor::extract_from_file`] is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// The tail of a file path, without extension. One leading directory is
    /// kept for each path separator in the pattern's literal text.
    Path,
    /// The input as given.
    #[default]
    Text,
}

impl FromStr for ExtractMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(Self::Path),
            "string" => Ok(Self::Text),
            other => Err(format!("unknown extract mode '{other}' (expected path or string)")),
        }
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Text => write!(f, "string"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    Text(String),
    Slot(String),
}

/// The outcome of matching one input.
///
/// On failure `message` says what went wrong and `result` holds whatever was
/// captured before that point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub result: BTreeMap<String, String>,
    pub message: Option<String>,
}

impl Extraction {
    pub fn is_ok(&self) -> bool {
        self.message.is_none()
    }

    fn failed(result: BTreeMap<String, String>, message: String) -> Self {
        Self {
            result,
            message: Some(message),
        }
    }
}

/// Advisory pattern statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Complexity {
    /// Distinct slot names (compared case-insensitively).
    pub arguments: usize,
    /// Slot names used more than once, and therefore cross-checked.
    pub verifiers: usize,
}

/// Extraction results for a block of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBatch {
    /// Slot names captured by at least one row, in pattern order.
    pub columns: Vec<String>,
    pub rows: Vec<Extraction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueExtractor {
    matchers: Vec<Match>,
    separators: usize,
    mode: ExtractMode,
}

impl KeyValueExtractor {
    pub fn new(mode: ExtractMode) -> Self {
        Self {
            matchers: Vec::new(),
            separators: 0,
            mode,
        }
    }

    /// Compile an extraction pattern.
    ///
    /// `%%` is a literal percent sign. An unclosed `%slot` is reported as an
    /// error, and its text is kept as a literal in the returned extractor.
    pub fn compile(pattern: &str, mode: ExtractMode) -> (Self, Option<String>) {
        let mut extractor = Self::new(mode);
        let mut capturing = false;
        let mut mem = String::new();

        for c in pattern.chars() {
            if c != SLOT_SIGN {
                mem.push(c);
                continue;
            }
            let captured = std::mem::take(&mut mem);
            if capturing {
                if captured.is_empty() {
                    mem.push(SLOT_SIGN);
                } else {
                    extractor.add_slot(captured);
                }
            } else if !captured.is_empty() {
                extractor.add_text(captured);
            }
            capturing = !capturing;
        }

        let error = capturing.then(|| format!("Format error: unclosed slot in {pattern}"));
        if !mem.is_empty() {
            extractor.add_text(mem);
        }
        (extractor, error)
    }

    /// Append a literal. Empty text is ignored.
    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        self.separators += text.chars().filter(|c| matches!(c, '/' | '\\')).count();
        self.matchers.push(Match::Text(text));
        self
    }

    pub fn add_slot(&mut self, name: impl Into<String>) -> &mut Self {
        self.matchers.push(Match::Slot(name.into()));
        self
    }

    pub fn matchers(&self) -> &[Match] {
        &self.matchers
    }

    pub fn mode(&self) -> ExtractMode {
        self.mode
    }

    /// Slot names in pattern order, without repeats.
    pub fn slot_names(&self) -> Vec<&str> {
        self.matchers
            .iter()
            .filter_map(|m| match m {
                Match::Slot(name) => Some(name.as_str()),
                Match::Text(_) => None,
            })
            .unique()
            .collect()
    }

    /// Match `input` according to the extractor's mode.
    pub fn extract_from_file(&self, input: &str) -> Extraction {
        match self.mode {
            ExtractMode::Path => self.extract(&self.path_text(input)),
            ExtractMode::Text => self.extract(input),
        }
    }

    /// Extract every non-blank line of `text`.
    pub fn extract_lines(&self, text: &str) -> LineBatch {
        let rows: Vec<Extraction> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.extract_from_file(line))
            .collect();
        let columns = self
            .slot_names()
            .into_iter()
            .filter(|name| rows.iter().any(|row| row.result.contains_key(*name)))
            .map(String::from)
            .collect();
        LineBatch { columns, rows }
    }

    /// Match `text` directly, ignoring the extractor's mode.
    pub fn extract(&self, text: &str) -> Extraction {
        let mut result = BTreeMap::new();
        let mut start = 0;
        let mut pending: Option<&str> = None;

        for m in &self.matchers {
            match m {
                Match::Text(literal) => {
                    let Some(offset) = text[start..].find(literal.as_str()) else {
                        let message = format!("Unable to find {literal} in {}", &text[start..]);
                        return Extraction::failed(result, message);
                    };
                    let end = start + offset;
                    if let Some(slot) = pending.take() {
                        let value = &text[start..end];
                        if !apply(&mut result, slot, value) {
                            let message = format!("Unable to apply <{value}> to {slot}");
                            return Extraction::failed(result, message);
                        }
                    }
                    start = end + literal.len();
                }
                Match::Slot(name) => {
                    if let Some(previous) = pending {
                        let message =
                            format!("Unable to separate {previous} from {name}: no text between them");
                        return Extraction::failed(result, message);
                    }
                    pending = Some(name.as_str());
                }
            }
        }

        if let Some(slot) = pending {
            let value = &text[start..];
            if !apply(&mut result, slot, value) {
                let message = format!("Unable to apply <{value}> to {slot}");
                return Extraction::failed(result, message);
            }
        }
        Extraction {
            result,
            message: None,
        }
    }

    pub fn complexity(&self) -> Complexity {
        let counts: HashMap<String, usize> = self
            .matchers
            .iter()
            .filter_map(|m| match m {
                Match::Slot(name) => Some(name.to_lowercase()),
                Match::Text(_) => None,
            })
            .counts();
        Complexity {
            arguments: counts.len(),
            verifiers: counts.values().filter(|&&n| n > 1).count(),
        }
    }

    /// Sum `counter` over the literal text of the pattern.
    pub fn count_in_text<F: Fn(&str) -> usize>(&self, counter: F) -> usize {
        self.matchers
            .iter()
            .map(|m| match m {
                Match::Text(text) => counter(text),
                Match::Slot(_) => 0,
            })
            .sum()
    }

    /// Rebuild the text to match from a file path: the file name without its
    /// extension, prefixed by as many parent directories as the pattern has
    /// separators.
    fn path_text(&self, path: &str) -> String {
        let normalized = path.replace('\\', "/");
        let mut parts: Vec<&str> = normalized.split('/').collect();
        let file = parts.pop().unwrap_or_default();
        let mut text = strip_extension(file).to_string();
        for _ in 0..self.separators {
            match parts.pop() {
                Some("") => {}
                Some(dir) => text = format!("{dir}/{text}"),
                None => break,
            }
        }
        text
    }
}

impl fmt::Display for KeyValueExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.matchers {
            match m {
                Match::Text(text) => write!(f, "{}", text.replace(SLOT_SIGN, "%%"))?,
                Match::Slot(name) => write!(f, "{SLOT_SIGN}{name}{SLOT_SIGN}")?,
            }
        }
        Ok(())
    }
}

fn strip_extension(file: &str) -> &str {
    match file.rfind('.') {
        Some(dot) if dot + 1 < file.len() => &file[..dot],
        _ => file,
    }
}

/// Record `value` for `slot`, failing if an earlier capture disagrees.
fn apply(result: &mut BTreeMap<String, String>, slot: &str, value: &str) -> bool {
    if let Some(found) = result.get(slot)
        && normalize(found) != normalize(value)
    {
        return false;
    }
    result.insert(slot.to_string(), value.to_string());
    true
}

/// Canonical form used to compare repeated captures: lowercase, no
/// underscores, no leading zeros, no surrounding whitespace. `07` and `7`
/// agree, as do `Foo_Bar` and `foobar`.
pub fn normalize(value: &str) -> String {
    let lowered = value.to_lowercase().replace('_', "");
    lowered.trim_start_matches('0').trim().to_string()
}
