use super::{ApplyFrame, BlockKind, Failure, Parser, Scope};
use crate::error::ConvertErrorKind;
use std::mem;

impl<'a> Parser<'a> {
    // -- Line directives ----------------------------------------------

    /// `%include;NAME` to end of line. Emits an include marker pointing at
    /// the converted file name and records the import. Quotes around the
    /// name are stripped; an EOF-terminated last line is accepted.
    pub(super) fn include(&mut self) -> Result<(), Failure> {
        let (line, _) = self.scanner.read_until(b'\n');
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Err(self.fail(ConvertErrorKind::EmptyInclude));
        }
        let name = trim_quotes(trimmed);
        if name.is_empty() {
            return Err(self.fail(ConvertErrorKind::EmptyInclude));
        }

        self.record
            .imports
            .insert(String::from_utf8_lossy(name).into_owned());

        let mut marker = Vec::with_capacity(name.len() + 32);
        marker.extend_from_slice(b"{% include '");
        marker.extend_from_slice(name);
        marker.extend_from_slice(b".html.j2' %}\n");
        self.emit(&marker);
        Ok(())
    }

    /// `%define;SIGNATURE` to end of line, then a body closed by `%end;`.
    /// The signature is carried into the macro marker verbatim.
    pub(super) fn define_block(&mut self) -> Result<(), Failure> {
        let (line, _) = self.scanner.read_until(b'\n');
        let signature = line.trim_ascii();
        if signature.is_empty() {
            return Err(self.fail(ConvertErrorKind::EmptyDefine));
        }

        let mut marker = Vec::with_capacity(signature.len() + 16);
        marker.extend_from_slice(b"{% macro ");
        marker.extend_from_slice(signature);
        marker.extend_from_slice(b" %}\n");
        self.emit(&marker);

        self.open_blocks.push(BlockKind::Define);
        self.drive_block(BlockKind::Define)?;
        self.emit(b"{% endmacro %}\n");
        Ok(())
    }

    // -- Conditional and loop blocks ------------------------------------

    /// `%if;COND` ... `%end;`, with `%else;`/`%elseif;` recognized only
    /// while this block is open.
    pub(super) fn if_block(&mut self) -> Result<(), Failure> {
        let cond = self.condition()?;

        let mut marker = Vec::with_capacity(cond.len() + 12);
        marker.extend_from_slice(b"{% if ");
        marker.extend_from_slice(&cond);
        marker.extend_from_slice(b" %}");
        self.emit(&marker);

        self.open_blocks.push(BlockKind::If);
        self.scopes.push(Scope::IfArms);
        let closed = self.drive_block(BlockKind::If);
        self.scopes.pop();
        closed?;

        self.emit(b"{% endif %}");
        Ok(())
    }

    /// `%else;` arm of the enclosing `%if;`. Only dispatched while an if
    /// scope is open.
    pub(super) fn else_arm(&mut self) -> Result<(), Failure> {
        self.emit(b"{% else %}");
        Ok(())
    }

    /// `%elseif;COND` arm. The marker spelling follows the legacy output
    /// contract downstream tooling normalizes, not Jinja's `elif`.
    pub(super) fn elseif_arm(&mut self) -> Result<(), Failure> {
        let cond = self.condition()?;
        let mut marker = Vec::with_capacity(cond.len() + 16);
        marker.extend_from_slice(b"{% elseif ");
        marker.extend_from_slice(&cond);
        marker.extend_from_slice(b" %}");
        self.emit(&marker);
        Ok(())
    }

    /// `%foreach;BINDING` ... `%end;`.
    pub(super) fn foreach_block(&mut self) -> Result<(), Failure> {
        let cond = self.condition()?;

        let mut marker = Vec::with_capacity(cond.len() + 13);
        marker.extend_from_slice(b"{% for ");
        marker.extend_from_slice(&cond);
        marker.extend_from_slice(b" %}");
        self.emit(&marker);

        self.open_blocks.push(BlockKind::Foreach);
        self.drive_block(BlockKind::Foreach)?;
        self.emit(b"{% endfor %}");
        Ok(())
    }

    // -- Apply ----------------------------------------------------------

    /// `%apply;NAME` followed by either a parenthesized argument list or a
    /// `%`-opened body whose arguments are separated by `%and;`. Both forms
    /// run to `%end;` and emit a call expression.
    pub(super) fn apply_call(&mut self) -> Result<(), Failure> {
        self.open_blocks.push(BlockKind::Apply);

        let (head, found) = self.scanner.read_until_any(&[b'(', b'%']);
        if !found {
            self.emit(head);
            return Err(self.fail(ConvertErrorKind::UnexpectedEof("apply directive")));
        }
        let name = &head[..head.len() - 1];
        if name.is_empty() {
            return Err(self.fail(ConvertErrorKind::InvalidApply));
        }
        self.record
            .functions
            .insert(String::from_utf8_lossy(name).into_owned());

        if head[head.len() - 1] == b'(' {
            // Parenthesized form: hand the '(' back so the condition
            // reader sees the balanced list, equality rewrite included.
            self.scanner.unread_byte();
            let args = self.condition()?;

            let mut call = Vec::with_capacity(name.len() + args.len() + 8);
            call.extend_from_slice(b"{{ ");
            call.extend_from_slice(name);
            call.extend_from_slice(&args);
            call.extend_from_slice(b" }}");
            self.emit(&call);

            return self.drive_block(BlockKind::Apply);
        }

        // With-body form: translated output is diverted into a scratch
        // buffer, `%and;` snapshots it as one argument, and the close
        // flushes the buffer as the final argument.
        self.applies.push(ApplyFrame::default());
        self.scopes.push(Scope::ApplyWith);
        let closed = self.drive_block(BlockKind::Apply);
        self.scopes.pop();
        let Some(frame) = self.applies.pop() else {
            return Err(self.fail(ConvertErrorKind::Internal("apply frame missing")));
        };
        closed?;

        let mut args = frame.args;
        args.push(frame.buf);

        let mut call = Vec::with_capacity(name.len() + 16);
        call.extend_from_slice(b"{{ ");
        call.extend_from_slice(name);
        call.push(b'(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                call.extend_from_slice(b", ");
            }
            call.extend_from_slice(arg);
        }
        call.extend_from_slice(b") }}");
        self.emit(&call);
        Ok(())
    }

    /// `%and;` inside a with-body apply: seals the scratch buffer as one
    /// argument and starts the next.
    pub(super) fn and_separator(&mut self) -> Result<(), Failure> {
        let Some(frame) = self.applies.last_mut() else {
            return Err(self.fail(ConvertErrorKind::Internal("and outside apply body")));
        };
        let arg = mem::take(&mut frame.buf);
        frame.args.push(arg);
        Ok(())
    }

    // -- Comments, variables, closes -------------------------------------

    /// `%(` ... `%)`. The content, leading `(` included, is wrapped in a
    /// Jinja comment; interior `%` bytes that do not close the comment are
    /// kept.
    pub(super) fn comment(&mut self) -> Result<(), Failure> {
        let mut content = Vec::new();
        loop {
            let (span, found) = self.scanner.read_until(b'%');
            if !found {
                content.extend_from_slice(span);
                self.emit(&content);
                return Err(self.fail(ConvertErrorKind::UnexpectedEof("comment")));
            }
            content.extend_from_slice(&span[..span.len() - 1]);
            match self.scanner.read_byte() {
                Some(b')') => break,
                Some(other) => {
                    content.push(b'%');
                    content.push(other);
                }
                None => {
                    content.push(b'%');
                    self.emit(&content);
                    return Err(self.fail(ConvertErrorKind::UnexpectedEof("comment")));
                }
            }
        }

        let mut marker = Vec::with_capacity(content.len() + 4);
        marker.extend_from_slice(b"{#");
        marker.extend_from_slice(&content);
        marker.extend_from_slice(b"#}");
        self.emit(&marker);
        Ok(())
    }

    /// Bare variable reference: a run of identifier bytes after the `%`.
    /// Letters and `_` may start it; digits and `.` may only continue it.
    /// A terminating `;` is consumed, any other terminator is pushed back.
    /// The reference is recorded and emitted even when the run is empty.
    pub(super) fn variable(&mut self) -> Result<(), Failure> {
        let mut ident: Vec<u8> = Vec::new();
        while let Some(b) = self.scanner.read_byte() {
            let accepted = b.is_ascii_alphabetic()
                || b == b'_'
                || (!ident.is_empty() && (b.is_ascii_digit() || b == b'.'));
            if accepted {
                ident.push(b);
                continue;
            }
            if b != b';' {
                self.scanner.unread_byte();
            }
            break;
        }

        let name = String::from_utf8_lossy(&ident).into_owned();
        let mut marker = Vec::with_capacity(name.len() + 8);
        marker.extend_from_slice(b"{{ ");
        marker.extend_from_slice(name.as_bytes());
        marker.extend_from_slice(b" }}");
        self.emit(&marker);
        self.record.variables.insert(name);
        Ok(())
    }

    /// `%end;`: pops the innermost open block and reports its kind so the
    /// drive loop can hand control back to the matching opener.
    pub(super) fn end_close(&mut self) -> Result<BlockKind, Failure> {
        match self.open_blocks.pop() {
            Some(kind) => Ok(kind),
            None => Err(self.fail(ConvertErrorKind::StrayEnd)),
        }
    }
}

/// Strips any run of single or double quotes from both ends.
fn trim_quotes(mut s: &[u8]) -> &[u8] {
    while let [b'"' | b'\'', rest @ ..] = s {
        s = rest;
    }
    while let [rest @ .., b'"' | b'\''] = s {
        s = rest;
    }
    s
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
