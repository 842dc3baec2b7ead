//! Record formatting and extraction.
//!
//! Display patterns turn a key/value record into text; extraction patterns
//! go the other way, pulling a record out of a line or a file path.
//!
//! # Example
//!
//! ```rust
//! use recordfmt::{CompiledPattern, ExtractMode, FunctionLibrary, KeyValueExtractor};
//!
//! let (extractor, error) = KeyValueExtractor::compile("%track% - %title%", ExtractMode::Text);
//! assert!(error.is_none());
//!
//! let extraction = extractor.extract_from_file("7 - dreams");
//! assert!(extraction.is_ok());
//!
//! let pattern = CompiledPattern::compile("$zfill(%track%). $capitalize(%title%)").unwrap();
//! let funcs = FunctionLibrary::with_defaults();
//! assert_eq!(pattern.evaluate(&funcs, &extraction.result).unwrap(), "007. Dreams");
//! ```

mod error;
pub mod extractor;
pub mod functions;
pub mod pattern;
mod record;

pub use error::EvalError;
pub use extractor::{Complexity, ExtractMode, Extraction, KeyValueExtractor, LineBatch, Match};
pub use functions::{Func, FunctionLibrary, MISSING_ARGUMENTS};
pub use pattern::{CompiledPattern, Node, parse_pattern};
pub use record::Record;
