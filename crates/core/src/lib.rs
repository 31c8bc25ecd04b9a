#![allow(clippy::result_large_err)]
//! recast-core: legacy template conversion engine.
//!
//! Converts documents written in the legacy `%`-marker syntax into
//! Jinja-style templates, collecting the variables, functions, and
//! includes each document references along the way.
//!
//! # Public API
//!
//! - [`convert()`] -- convert one document, faults confined to it
//! - [`JinjaTemplate`] -- converted body plus collected metadata
//! - [`ConvertError`] / [`ConvertErrorKind`] -- what failed, where, and
//!   the partial output produced up to that point
//!
//! The byte [`scanner`] is public for tooling that wants to walk legacy
//! sources itself; the parser is not, its surface is [`convert()`].

pub mod convert;
pub mod error;
mod parser;
pub mod scanner;
pub mod template;

// ── Convenience re-exports ────────────────────────────────────────────

pub use convert::convert;
pub use error::{ConvertError, ConvertErrorKind};
pub use template::JinjaTemplate;
