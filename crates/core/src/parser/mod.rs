//! Single-pass parser for the legacy `%`-marker template syntax.
//!
//! The parser copies plain text through verbatim and dispatches on `%`
//! markers. Block constructs recurse: each opener drives the parse loop
//! until the matching `%end;` closes it, so nesting follows the call
//! stack. See [`handlers`] for what each construct emits.

use crate::error::{ConvertError, ConvertErrorKind};
use crate::scanner::Scanner;
use crate::template::JinjaTemplate;

mod condition;
mod handlers;

// ──────────────────────────────────────────────
// Dispatch tables
// ──────────────────────────────────────────────

/// Directive keywords. Base keywords are recognized everywhere; `Else`,
/// `Elseif`, and `And` exist only through a [`Scope`] extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Include,
    If,
    Define,
    Apply,
    Foreach,
    End,
    Else,
    Elseif,
    And,
}

/// Keywords recognized in every context.
const BASE_KEYWORDS: &[(&str, Keyword)] = &[
    ("include", Keyword::Include),
    ("end", Keyword::End),
    ("if", Keyword::If),
    ("define", Keyword::Define),
    ("apply", Keyword::Apply),
    ("foreach", Keyword::Foreach),
];

/// Grammar extensions visible only while their block is open. The lookup
/// consults open scopes innermost-first, then the base table, so `%else;`
/// means nothing outside an `%if;` and `%and;` nothing outside a
/// with-body `%apply;` -- both fall back to bare-variable handling there.
#[derive(Debug, Clone, Copy)]
enum Scope {
    IfArms,
    ApplyWith,
}

impl Scope {
    fn keywords(self) -> &'static [(&'static str, Keyword)] {
        match self {
            Scope::IfArms => &[("else", Keyword::Else), ("elseif", Keyword::Elseif)],
            Scope::ApplyWith => &[("and", Keyword::And)],
        }
    }
}

fn find_keyword(table: &[(&str, Keyword)], key: &[u8]) -> Option<Keyword> {
    table
        .iter()
        .find(|(word, _)| word.as_bytes() == key)
        .map(|&(_, kw)| kw)
}

// ──────────────────────────────────────────────
// Parser state
// ──────────────────────────────────────────────

/// Blocks that stay open until an explicit `%end;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Foreach,
    Define,
    Apply,
}

impl BlockKind {
    fn name(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Foreach => "foreach",
            BlockKind::Define => "define",
            BlockKind::Apply => "apply",
        }
    }

    fn context(self) -> &'static str {
        match self {
            BlockKind::If => "if block",
            BlockKind::Foreach => "foreach block",
            BlockKind::Define => "define block",
            BlockKind::Apply => "apply block",
        }
    }
}

/// Why a drive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// An `%end;` closed a block of this kind.
    Closed(BlockKind),
    /// Input ran out.
    Eof,
}

/// One open with-body `%apply;`: arguments collected so far plus the
/// scratch buffer receiving the argument currently being parsed.
#[derive(Debug, Default)]
struct ApplyFrame {
    args: Vec<Vec<u8>>,
    buf: Vec<u8>,
}

/// An error raised mid-parse. [`Parser::run`] attaches the partially
/// converted record when it unwinds, producing the public [`ConvertError`].
#[derive(Debug)]
struct Failure {
    kind: ConvertErrorKind,
    offset: usize,
    trace: Vec<&'static str>,
}

pub(crate) struct Parser<'a> {
    scanner: Scanner<'a>,
    record: JinjaTemplate,
    /// Open with-body applies, innermost last. While non-empty, emitted
    /// bytes go to the top frame's scratch buffer instead of the record.
    applies: Vec<ApplyFrame>,
    /// Pending closes, innermost last: one entry per open block, popped by
    /// `%end;`.
    open_blocks: Vec<BlockKind>,
    /// Scope-local grammar extensions, innermost last.
    scopes: Vec<Scope>,
    /// Construct labels for diagnostic traces, outermost first.
    frames: Vec<&'static str>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(name: &str, source: &'a [u8]) -> Self {
        Parser {
            scanner: Scanner::new(source),
            record: JinjaTemplate::new(name),
            applies: Vec::new(),
            open_blocks: Vec::new(),
            scopes: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Converts the whole document.
    pub(crate) fn run(mut self) -> Result<JinjaTemplate, ConvertError> {
        match self.document() {
            Ok(()) => Ok(self.record),
            Err(failure) => Err(ConvertError {
                template: self.record.name.clone(),
                kind: failure.kind,
                offset: failure.offset,
                trace: failure.trace,
                partial: self.record,
            }),
        }
    }

    fn document(&mut self) -> Result<(), Failure> {
        match self.in_frame("document", Self::drive)? {
            Stop::Eof => Ok(()),
            // Only reachable if an `%end;` escapes every handler, which
            // `end_close` already rules out. Treated as a mismatch anyway.
            Stop::Closed(kind) => Err(self.fail(ConvertErrorKind::MismatchedEnd {
                expected: "end of input",
                found: kind.name(),
            })),
        }
    }

    // -- Drive loop --------------------------------------------------

    /// Copies text until the next `%` marker, dispatches it, and repeats.
    /// Returns when an `%end;` closes a block or the input ends.
    fn drive(&mut self) -> Result<Stop, Failure> {
        loop {
            let (span, found) = self.scanner.read_until(b'%');
            if !found {
                self.emit(span);
                return Ok(Stop::Eof);
            }
            self.emit(&span[..span.len() - 1]);
            if let Some(kind) = self.directive()? {
                return Ok(Stop::Closed(kind));
            }
        }
    }

    /// Drives the body of an open block and checks that the close matches.
    /// A close for some other kind means the document's `%end;` markers
    /// are paired against the wrong openers.
    fn drive_block(&mut self, kind: BlockKind) -> Result<(), Failure> {
        match self.drive()? {
            Stop::Closed(closed) if closed == kind => Ok(()),
            Stop::Closed(closed) => Err(self.fail(ConvertErrorKind::MismatchedEnd {
                expected: kind.name(),
                found: closed.name(),
            })),
            Stop::Eof => Err(self.fail(ConvertErrorKind::UnexpectedEof(kind.context()))),
        }
    }

    // -- Marker dispatch ----------------------------------------------

    /// Handles one marker, with the scanner positioned just past the `%`.
    /// Returns the closed block kind when the marker was an `%end;`.
    fn directive(&mut self) -> Result<Option<BlockKind>, Failure> {
        let window = self.scanner.peek(self.longest_keyword() + 1);
        if window.first() == Some(&b'(') {
            return self.in_frame("comment", Self::comment).map(|()| None);
        }

        // Recover the keyword candidate: everything up to the first ';' or
        // newline in the window, with one trailing ';' stripped.
        let mut token = match window.iter().position(|&b| b == b';' || b == b'\n') {
            Some(at) => &window[..=at],
            None => window,
        };
        if token.last() == Some(&b';') {
            token = &token[..token.len() - 1];
        }

        match self.lookup(token.trim_ascii()) {
            Some(kw) => {
                // The marker token is consumed along with its terminator;
                // the handler reads from there.
                self.scanner.discard(token.len() + 1);
                self.dispatch_keyword(kw)
            }
            None => self.in_frame("variable", Self::variable).map(|()| None),
        }
    }

    fn dispatch_keyword(&mut self, kw: Keyword) -> Result<Option<BlockKind>, Failure> {
        match kw {
            Keyword::Include => self.in_frame("include directive", Self::include).map(|()| None),
            Keyword::If => self.in_frame("if block", Self::if_block).map(|()| None),
            Keyword::Define => self.in_frame("define block", Self::define_block).map(|()| None),
            Keyword::Apply => self.in_frame("apply call", Self::apply_call).map(|()| None),
            Keyword::Foreach => self
                .in_frame("foreach block", Self::foreach_block)
                .map(|()| None),
            Keyword::Else => self.in_frame("else arm", Self::else_arm).map(|()| None),
            Keyword::Elseif => self.in_frame("elseif arm", Self::elseif_arm).map(|()| None),
            Keyword::And => self.in_frame("and separator", Self::and_separator).map(|()| None),
            Keyword::End => self.in_frame("end directive", Self::end_close).map(Some),
        }
    }

    /// Looks a marker token up in the open scopes (innermost first), then
    /// the base table.
    fn lookup(&self, key: &[u8]) -> Option<Keyword> {
        for scope in self.scopes.iter().rev() {
            if let Some(kw) = find_keyword(scope.keywords(), key) {
                return Some(kw);
            }
        }
        find_keyword(BASE_KEYWORDS, key)
    }

    /// Longest keyword currently recognizable, bounding the peek window.
    fn longest_keyword(&self) -> usize {
        let base = BASE_KEYWORDS.iter().map(|(w, _)| w.len()).max().unwrap_or(0);
        self.scopes
            .iter()
            .flat_map(|s| s.keywords().iter().map(|(w, _)| w.len()))
            .fold(base, usize::max)
    }

    // -- Plumbing -----------------------------------------------------

    /// Appends translated bytes to the active sink: the innermost with-body
    /// apply argument when one is open, the record body otherwise.
    fn emit(&mut self, bytes: &[u8]) {
        match self.applies.last_mut() {
            Some(frame) => frame.buf.extend_from_slice(bytes),
            None => self.record.body.extend_from_slice(bytes),
        }
    }

    /// Reads one condition, flushing whatever partial bytes were read if
    /// the input ends before it closes.
    fn condition(&mut self) -> Result<Vec<u8>, Failure> {
        match condition::read_condition(&mut self.scanner) {
            Ok(cond) => Ok(cond),
            Err(unterminated) => {
                self.emit(&unterminated.bytes);
                Err(self.fail(ConvertErrorKind::UnexpectedEof("condition")))
            }
        }
    }

    /// Runs `f` with `label` on the trace stack. Push and pop must pair
    /// exactly; a mismatch on pop is an engine defect and fails the parse.
    fn in_frame<T>(
        &mut self,
        label: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, Failure>,
    ) -> Result<T, Failure> {
        self.frames.push(label);
        let result = f(self);
        if self.frames.pop() != Some(label) {
            return Err(self.fail(ConvertErrorKind::Internal("frame stack out of order")));
        }
        result
    }

    /// Builds a failure at the scanner's current position, snapshotting the
    /// construct trace.
    fn fail(&self, kind: ConvertErrorKind) -> Failure {
        Failure {
            kind,
            offset: self.scanner.offset(),
            trace: self.frames.clone(),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
