//! Display patterns: templates that turn a record into a line of text.
//!
//! # Pattern syntax
//!
//! | Token              | Meaning                                          |
//! |--------------------|--------------------------------------------------|
//! | `text`             | Literal text                                     |
//! | `%name%`           | Value of attribute `name`, empty if absent       |
//! | `%%`               | A literal `%`                                    |
//! | `$func(a, b, ...)` | Call `func`; each argument is itself a pattern   |
//!
//! Function names start with an ASCII letter and continue with ASCII letters
//! or digits. Inside an argument list only commas and the closing paren at
//! nesting depth 0 are structural, so `$upper($trim(%a%, _))` works.

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::Node;
pub use eval::evaluate;
pub use parser::{PatternError, parse};

use crate::error::EvalError;
use crate::functions::FunctionLibrary;
use crate::record::Record;

impl From<PatternError> for EvalError {
    fn from(err: PatternError) -> Self {
        EvalError::SyntaxError {
            detail: err.to_string(),
        }
    }
}

/// A parsed pattern, ready to be evaluated against any number of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    root: Node,
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> Result<Self, EvalError> {
        Ok(Self {
            root: parse(pattern)?,
        })
    }

    /// A pattern that evaluates to the empty string.
    pub fn empty() -> Self {
        Self { root: Node::empty() }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn evaluate<R: Record + ?Sized>(
        &self,
        funcs: &FunctionLibrary,
        record: &R,
    ) -> Result<String, EvalError> {
        evaluate(&self.root, funcs, record)
    }

    /// The evaluated text, or the error's kind tag when evaluation fails.
    pub fn display<R: Record + ?Sized>(&self, funcs: &FunctionLibrary, record: &R) -> String {
        match self.evaluate(funcs, record) {
            Ok(text) => text,
            Err(err) => err.kind().to_string(),
        }
    }

    /// True if the displayed text contains `term`, ignoring case.
    pub fn matches_filter<R: Record + ?Sized>(
        &self,
        funcs: &FunctionLibrary,
        record: &R,
        term: &str,
    ) -> bool {
        self.display(funcs, record)
            .to_lowercase()
            .contains(&term.to_lowercase())
    }
}

/// Compile `pattern`, always returning something evaluable.
///
/// On a syntax error the returned pattern evaluates to the empty string, for
/// callers that only want to show the error alongside an empty result.
pub fn parse_pattern(pattern: &str) -> (CompiledPattern, Option<EvalError>) {
    match CompiledPattern::compile(pattern) {
        Ok(compiled) => (compiled, None),
        Err(err) => (CompiledPattern::empty(), Some(err)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_pattern_ok() {
        let (p, err) = parse_pattern("%name%");
        assert!(err.is_none());
        let funcs = FunctionLibrary::with_defaults();
        assert_eq!(p.evaluate(&funcs, &record(&[("name", "x")])).unwrap(), "x");
        assert_eq!(p.evaluate(&funcs, &record(&[])).unwrap(), "");
    }

    #[test]
    fn test_parse_pattern_syntax_error_evaluates_empty() {
        let (p, err) = parse_pattern("%name");
        let err = err.expect("should report a syntax error");
        assert_eq!(err.kind(), "SyntaxError");
        let funcs = FunctionLibrary::with_defaults();
        assert_eq!(p.evaluate(&funcs, &record(&[("name", "x")])).unwrap(), "");
    }

    #[test]
    fn test_syntax_error_detail() {
        let err = CompiledPattern::compile("$upper(%name%").unwrap_err();
        assert_eq!(
            err,
            EvalError::SyntaxError {
                detail: "Unclosed argument list for function 'upper'".into()
            }
        );
    }

    #[test]
    fn test_deep_nesting_is_syntax_error() {
        let pattern = format!("{}x{}", "$upper(".repeat(1000), ")".repeat(1000));
        let (p, err) = parse_pattern(&pattern);
        assert_eq!(err.expect("should be rejected").kind(), "SyntaxError");
        let funcs = FunctionLibrary::with_defaults();
        assert_eq!(p.evaluate(&funcs, &record(&[])).unwrap(), "");
    }

    #[test]
    fn test_display_degrades_to_kind() {
        let funcs = FunctionLibrary::with_defaults();
        let p = CompiledPattern::compile("$nosuch(%name%)").unwrap();
        assert_eq!(p.display(&funcs, &record(&[("name", "x")])), "MissingFunction");
        let p = CompiledPattern::compile("$upper(%name%)").unwrap();
        assert_eq!(p.display(&funcs, &record(&[("name", "ab")])), "AB");
    }

    #[test]
    fn test_matches_filter() {
        let funcs = FunctionLibrary::with_defaults();
        let p = CompiledPattern::compile("%artist% - %title%").unwrap();
        let r = record(&[("artist", "Zynic"), ("title", "Dreams")]);
        assert!(p.matches_filter(&funcs, &r, "zyn"));
        assert!(p.matches_filter(&funcs, &r, "DREAMS"));
        assert!(p.matches_filter(&funcs, &r, ""));
        assert!(!p.matches_filter(&funcs, &r, "nightmares"));
    }

    #[test]
    fn test_compiled_pattern_is_reusable() {
        let funcs = FunctionLibrary::with_defaults();
        let p = CompiledPattern::compile("$zfill(%track%,3)").unwrap();
        assert_eq!(p.evaluate(&funcs, &record(&[("track", "7")])).unwrap(), "007");
        assert_eq!(p.evaluate(&funcs, &record(&[("track", "12")])).unwrap(), "012");
    }

    #[test]
    fn test_shared_across_threads() {
        let funcs = FunctionLibrary::with_defaults();
        let p = CompiledPattern::compile("$upper(%name%)").unwrap();
        std::thread::scope(|s| {
            for name in ["a", "b", "c"] {
                let (p, funcs) = (&p, &funcs);
                s.spawn(move || {
                    let out = p.evaluate(funcs, &record(&[("name", name)])).unwrap();
                    assert_eq!(out, name.to_uppercase());
                });
            }
        });
    }

    /// Patterns built only from balanced constructs: text without sigils,
    /// attribute references, escaped percents, and known calls.
    fn balanced_pattern() -> impl Strategy<Value = String> {
        let leaf = prop_oneof![
            "[a-z .-]{0,8}",
            "[a-z]{1,6}".prop_map(|name| format!("%{name}%")),
            Just("%%".to_string()),
        ];
        let piece = leaf.prop_recursive(3, 24, 3, |inner| {
            (
                prop::sample::select(vec!["upper", "lower", "capitalize", "trim", "zfill"]),
                prop::collection::vec(inner, 1..3),
            )
                .prop_map(|(name, args)| format!("${name}({})", args.join(",")))
        });
        prop::collection::vec(piece, 0..5).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn balanced_patterns_never_error(pattern in balanced_pattern()) {
            let p = CompiledPattern::compile(&pattern);
            prop_assert!(p.is_ok(), "{pattern:?} failed to parse: {:?}", p.as_ref().err());
            let funcs = FunctionLibrary::with_defaults();
            let names = ["a", "b", "name", "title"];
            let r = record(&names.map(|n| (n, "value")));
            prop_assert!(p.unwrap().evaluate(&funcs, &r).is_ok());
        }
    }
}
