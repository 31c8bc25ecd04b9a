//! Converted-template record: translated body plus collected metadata.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// The product of one conversion: the translated body and the variables,
/// functions, and imports the parser saw along the way.
///
/// Metadata lives in sorted sets so repeated references collapse and
/// reports iterate deterministically.
#[derive(Debug, Clone, Serialize)]
pub struct JinjaTemplate {
    /// Source path relative to the input root, without its extension.
    pub name: String,
    /// Translated body. Skipped in JSON reports; the body goes to the
    /// output file instead.
    #[serde(skip)]
    pub body: Vec<u8>,
    pub variables: BTreeSet<String>,
    pub functions: BTreeSet<String>,
    pub imports: BTreeSet<String>,
}

impl JinjaTemplate {
    pub fn new(name: &str) -> Self {
        JinjaTemplate {
            name: name.to_owned(),
            body: Vec::new(),
            variables: BTreeSet::new(),
            functions: BTreeSet::new(),
            imports: BTreeSet::new(),
        }
    }

    /// The translated body decoded as UTF-8, lossily. Legacy templates are
    /// not guaranteed to be valid UTF-8, so this is for logs and tests;
    /// file output writes the raw bytes.
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
