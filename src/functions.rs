//! Named string functions callable from patterns as `$name(arg, ...)`.
//!
//! Builtins never fail through [`EvalError`](crate::EvalError): a call with
//! too few arguments, or with an argument that cannot be used, returns an
//! `ERR: ...` string that ends up in the output like any other text.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use phf::{Map, phf_map};
use regex::{NoExpand, Regex};

/// A pattern-callable function: resolved argument strings in, text out.
pub type Func = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

type Builtin = fn(&[String]) -> String;

/// Text returned by a builtin called with fewer arguments than it needs.
pub const MISSING_ARGUMENTS: &str = "ERR: missing required arguments";

/// Widest padding `zfill` will produce.
pub const MAX_ZFILL_WIDTH: usize = 1024;

/// The default registry. Please keep names sorted alphabetically.
static BUILTINS: Map<&'static str, Builtin> = phf_map! {
    "capitalize" => capitalize as Builtin,
    "lower" => lower as Builtin,
    "ltrim" => ltrim as Builtin,
    "replace" => replace as Builtin,
    "rtrim" => rtrim as Builtin,
    "trim" => trim as Builtin,
    "upper" => upper as Builtin,
    "zfill" => zfill as Builtin,
};

/// Mapping from case-sensitive function name to implementation.
///
/// The library is only read during evaluation, so one instance can be shared
/// by any number of patterns.
#[derive(Clone, Default)]
pub struct FunctionLibrary {
    functions: HashMap<String, Func>,
}

impl FunctionLibrary {
    /// An empty library; every call will be reported as a missing function.
    pub fn new() -> Self {
        Self::default()
    }

    /// The builtin string functions (`capitalize`, `lower`, `upper`, `ltrim`,
    /// `rtrim`, `trim`, `zfill`, `replace`).
    pub fn with_defaults() -> Self {
        let functions = BUILTINS
            .entries()
            .map(|(name, f)| (name.to_string(), Arc::new(*f) as Func))
            .collect();
        Self { functions }
    }

    /// Add or replace a function.
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Func> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Function names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).sorted().collect()
    }
}

impl std::fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionLibrary")
            .field("functions", &self.names())
            .finish()
    }
}

fn capitalize(args: &[String]) -> String {
    let [s, ..] = args else {
        return MISSING_ARGUMENTS.to_string();
    };
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower(args: &[String]) -> String {
    match args {
        [s, ..] => s.to_lowercase(),
        [] => MISSING_ARGUMENTS.to_string(),
    }
}

fn upper(args: &[String]) -> String {
    match args {
        [s, ..] => s.to_uppercase(),
        [] => MISSING_ARGUMENTS.to_string(),
    }
}

fn ltrim(args: &[String]) -> String {
    trim_ends(args, Ends::Start)
}

fn rtrim(args: &[String]) -> String {
    trim_ends(args, Ends::End)
}

fn trim(args: &[String]) -> String {
    trim_ends(args, Ends::Both)
}

#[derive(Clone, Copy)]
enum Ends {
    Start,
    End,
    Both,
}

/// Strip characters from the selected ends. The optional second argument is
/// a regex class body (so `a-z` is a range); empty or absent means whitespace.
fn trim_ends(args: &[String], ends: Ends) -> String {
    let [s, rest @ ..] = args else {
        return MISSING_ARGUMENTS.to_string();
    };
    let set = rest.first().map(String::as_str).unwrap_or("");
    if set.is_empty() {
        return match ends {
            Ends::Start => s.trim_start(),
            Ends::End => s.trim_end(),
            Ends::Both => s.trim(),
        }
        .to_string();
    }
    let pattern = match ends {
        Ends::Start => format!("^[{set}]+"),
        Ends::End => format!("[{set}]+$"),
        Ends::Both => format!("^[{set}]+|[{set}]+$"),
    };
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(s, "").into_owned(),
        Err(_) => format!("ERR: invalid character set {set}"),
    }
}

fn zfill(args: &[String]) -> String {
    let [s, rest @ ..] = args else {
        return MISSING_ARGUMENTS.to_string();
    };
    let width = rest.first().map(String::as_str).unwrap_or("3");
    match parse_leading_int(width) {
        Some(width) if width > MAX_ZFILL_WIDTH => format!("ERR: width {width} too large"),
        Some(width) => {
            let len = s.chars().count();
            if len >= width {
                s.clone()
            } else {
                "0".repeat(width - len) + s
            }
        }
        None => s.clone(),
    }
}

/// Leading decimal digits of `s` (after leading whitespace), as a width.
/// Anything unparseable, including a width that overflows `usize`, leaves the
/// text unpadded.
fn parse_leading_int(s: &str) -> Option<usize> {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn replace(args: &[String]) -> String {
    let [text, pattern, rest @ ..] = args else {
        return MISSING_ARGUMENTS.to_string();
    };
    let replacement = rest.first().map(String::as_str).unwrap_or("");
    match Regex::new(pattern) {
        Ok(re) => re.replacen(text, 1, NoExpand(replacement)).into_owned(),
        Err(_) => format!("ERR: invalid pattern {pattern}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[&str]) -> String {
        let lib = FunctionLibrary::with_defaults();
        let f = lib.get(name).expect("builtin should exist");
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        f(args.as_slice())
    }

    #[test]
    fn test_default_names_sorted() {
        let lib = FunctionLibrary::with_defaults();
        assert_eq!(
            lib.names(),
            vec!["capitalize", "lower", "ltrim", "replace", "rtrim", "trim", "upper", "zfill"]
        );
    }

    #[test]
    fn test_empty_library() {
        let lib = FunctionLibrary::new();
        assert!(lib.names().is_empty());
        assert!(!lib.contains("upper"));
    }

    #[test]
    fn test_insert_overrides_builtin() {
        let mut lib = FunctionLibrary::with_defaults();
        lib.insert("upper", |_| "shout".to_string());
        let f = lib.get("upper").unwrap();
        assert_eq!(f(&["a".to_string()][..]), "shout");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let lib = FunctionLibrary::with_defaults();
        assert!(lib.contains("upper"));
        assert!(!lib.contains("Upper"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(call("capitalize", &["dreams in black"]), "Dreams in black");
        assert_eq!(call("capitalize", &["éclair"]), "Éclair");
        assert_eq!(call("capitalize", &[""]), "");
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(call("upper", &["ab"]), "AB");
        assert_eq!(call("lower", &["AbC"]), "abc");
    }

    #[test]
    fn test_trim_whitespace_default() {
        assert_eq!(call("trim", &["  a b  "]), "a b");
        assert_eq!(call("ltrim", &["  a  "]), "a  ");
        assert_eq!(call("rtrim", &["  a  "]), "  a");
        assert_eq!(call("trim", &["  a  ", ""]), "a");
    }

    #[test]
    fn test_trim_with_set() {
        assert_eq!(call("trim", &["__a_b__", "_"]), "a_b");
        assert_eq!(call("ltrim", &["007", "0"]), "7");
        assert_eq!(call("rtrim", &["abc123", "0-9"]), "abc");
    }

    #[test]
    fn test_trim_invalid_set() {
        assert!(call("trim", &["abc", "z-a"]).starts_with("ERR: "));
    }

    #[test]
    fn test_zfill() {
        assert_eq!(call("zfill", &["7"]), "007");
        assert_eq!(call("zfill", &["7", "2"]), "07");
        assert_eq!(call("zfill", &["1234", "2"]), "1234");
        assert_eq!(call("zfill", &["7", "five"]), "7");
    }

    #[test]
    fn test_zfill_huge_width() {
        assert_eq!(call("zfill", &["7", "1025"]), "ERR: width 1025 too large");
        assert_eq!(call("zfill", &["7", "9999999999999999999"]), "ERR: width 9999999999999999999 too large");
        assert_eq!(call("zfill", &["7", "99999999999999999999999"]), "7");
        assert_eq!(call("zfill", &["7", "1024"]).len(), 1024);
    }

    #[test]
    fn test_replace_first_match_only() {
        assert_eq!(call("replace", &["a-b-c", "-", "+"]), "a+b-c");
        assert_eq!(call("replace", &["track 07", "[0-9]+", "#"]), "track #");
        assert_eq!(call("replace", &["abc", "b"]), "ac");
    }

    #[test]
    fn test_replace_invalid_pattern() {
        assert!(call("replace", &["abc", "("]).starts_with("ERR: "));
    }

    #[test]
    fn test_missing_arguments_is_text() {
        for name in ["capitalize", "lower", "upper", "ltrim", "rtrim", "trim", "zfill"] {
            assert_eq!(call(name, &[]), MISSING_ARGUMENTS, "{name}");
        }
        assert_eq!(call("replace", &["only one"]), MISSING_ARGUMENTS);
    }
}
