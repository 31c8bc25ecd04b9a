use crate::scanner::Scanner;

/// Input ended before the condition closed. Whatever was read is handed
/// back so the caller can flush it into the output before failing.
pub(super) struct Unterminated {
    pub(super) bytes: Vec<u8>,
}

/// Reads the condition expression that follows `%if;`, `%elseif;`,
/// `%foreach;`, or a parenthesized `%apply;` argument list.
///
/// Two forms exist. A condition starting with `(` is read to its balanced
/// closing parenthesis (nesting counted, parentheses kept) and has bare
/// `=` rewritten to `==`. Anything else is the short form: read to the
/// next `;`, returned verbatim with the `;` dropped and no rewriting.
pub(super) fn read_condition(scanner: &mut Scanner<'_>) -> Result<Vec<u8>, Unterminated> {
    if scanner.peek(1) != b"(" {
        let (span, found) = scanner.read_until(b';');
        if !found {
            return Err(Unterminated {
                bytes: span.to_vec(),
            });
        }
        return Ok(span[..span.len() - 1].to_vec());
    }

    let mut bytes = Vec::new();
    let mut depth = 0usize;
    loop {
        let Some(b) = scanner.read_byte() else {
            return Err(Unterminated { bytes });
        };
        bytes.push(b);
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    Ok(rewrite_equality(&bytes))
}

/// Rewrites legacy single `=` comparisons to `==`.
///
/// A `=` is left alone when it is the first byte, already part of `==` or
/// `!=`, or immediately followed by another `=`. The decision looks at the
/// source bytes only, so a run like `a=b=c` becomes `a==b==c` in one pass
/// and rewritten text passes through unchanged.
pub(super) fn rewrite_equality(cond: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(cond.len());
    for (i, &b) in cond.iter().enumerate() {
        out.push(b);
        if b != b'=' {
            continue;
        }
        let lone_eq = i > 0
            && i + 1 < cond.len()
            && !matches!(cond[i - 1], b'=' | b'!')
            && cond[i + 1] != b'=';
        if lone_eq {
            out.push(b'=');
        }
    }
    out
}
