//! Byte cursor over an in-memory legacy template.
//!
//! All reads operate on a slice, so end of input is the only failure mode;
//! it surfaces as `None` returns and `found` flags rather than errors.

/// Sequential byte access with one-byte push-back and bounded lookahead.
pub struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Scanner { data, pos: 0 }
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Reads the next byte, or `None` at end of input.
    pub fn read_byte(&mut self) -> Option<u8> {
        let b = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    /// Pushes the most recently read byte back. A no-op at the start of
    /// input.
    pub fn unread_byte(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Returns up to `n` bytes of lookahead without consuming them. The
    /// result is shorter than `n` only when the input ends first.
    pub fn peek(&self, n: usize) -> &'a [u8] {
        &self.data[self.pos..self.data.len().min(self.pos + n)]
    }

    /// Reads through the next occurrence of `delim`. The delimiter is
    /// consumed and included in the returned span. When the delimiter never
    /// appears, returns the remaining input with `found = false`.
    pub fn read_until(&mut self, delim: u8) -> (&'a [u8], bool) {
        self.read_until_any(&[delim])
    }

    /// Like [`read_until`](Self::read_until), stopping at the first byte
    /// that appears in `delims`.
    pub fn read_until_any(&mut self, delims: &[u8]) -> (&'a [u8], bool) {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|b| delims.contains(b)) {
            Some(at) => {
                self.pos += at + 1;
                (&rest[..=at], true)
            }
            None => {
                self.pos = self.data.len();
                (rest, false)
            }
        }
    }

    /// Skips up to `n` bytes, returning how many were actually skipped.
    /// Skipping past the end of input clamps instead of failing.
    pub fn discard(&mut self, n: usize) -> usize {
        let skipped = n.min(self.data.len() - self.pos);
        self.pos += skipped;
        skipped
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
