use crate::template::JinjaTemplate;

/// What went wrong while converting one template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertErrorKind {
    /// Input ran out while a block, condition, comment, or directive line
    /// was still open.
    #[error("input ended inside {0}")]
    UnexpectedEof(&'static str),

    /// An `%end;` with no block open.
    #[error("%end; with no open block")]
    StrayEnd,

    /// An `%end;` closed an inner block, but the handler waiting for the
    /// close was opened by a different construct.
    #[error("%end; closed '{found}' where '{expected}' was still open")]
    MismatchedEnd {
        expected: &'static str,
        found: &'static str,
    },

    /// `%include;` with nothing (or only quotes) on the rest of the line.
    #[error("empty include directive")]
    EmptyInclude,

    /// `%define;` with no macro signature on the rest of the line.
    #[error("empty define directive")]
    EmptyDefine,

    /// `%apply;` with no function name before its argument form.
    #[error("apply directive with no function name")]
    InvalidApply,

    /// Engine defect, not a document defect: a parser stack was pushed and
    /// popped out of order.
    #[error("internal consistency failure: {0}")]
    Internal(&'static str),

    /// A panic raised during conversion, caught at the per-document
    /// boundary.
    #[error("conversion fault: {0}")]
    Fault(String),
}

/// A failed conversion.
///
/// Carries the byte offset where parsing stopped, the stack of constructs
/// the parser was inside when the error was raised, and the record as
/// converted so far. Partial output is kept for diagnosis, never written
/// as a converted file.
#[derive(Debug, Clone, thiserror::Error)]
#[error("template '{template}': {kind} at byte {offset}")]
pub struct ConvertError {
    pub template: String,
    pub kind: ConvertErrorKind,
    pub offset: usize,
    pub trace: Vec<&'static str>,
    pub partial: JinjaTemplate,
}

impl ConvertError {
    /// Wraps a caught panic payload.
    pub(crate) fn fault(name: &str, message: String) -> Self {
        ConvertError {
            template: name.to_owned(),
            kind: ConvertErrorKind::Fault(message),
            offset: 0,
            trace: Vec::new(),
            partial: JinjaTemplate::new(name),
        }
    }

    /// Serialize for machine-readable error output. The partial body is
    /// omitted; it is diagnostic state, not a result.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "template": self.template,
            "error":    self.kind.to_string(),
            "offset":   self.offset,
            "trace":    self.trace,
        })
    }
}
