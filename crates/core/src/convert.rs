//! Public conversion entry point with a per-document fault boundary.

use crate::error::ConvertError;
use crate::parser::Parser;
use crate::template::JinjaTemplate;
use std::panic;

/// Converts one legacy template into its [`JinjaTemplate`] record.
///
/// `name` is the template's extension-less relative path; it names the
/// record, the output file derived from it, and any error report.
///
/// Faults are confined to this document: a structural defect produces a
/// [`ConvertError`], and a panic inside the engine is caught here and
/// reported as one rather than tearing down the batch.
pub fn convert(name: &str, source: &[u8]) -> Result<JinjaTemplate, ConvertError> {
    match panic::catch_unwind(|| Parser::new(name, source).run()) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_owned()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_owned()
            };
            Err(ConvertError::fault(name, message))
        }
    }
}
