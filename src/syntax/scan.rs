//! Quote- and bracket-aware scanning over a single line.
//!
//! Every textual pass in the engine goes through these helpers so that no
//! substitution is ever applied inside an open string literal.

/// Tracks single/double quote state one character at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuoteScanner {
    quote: Option<char>,
    escaped: bool,
}

impl QuoteScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one character. Returns true when the character belongs to a
    /// quoted region, delimiters included.
    pub fn step(&mut self, ch: char) -> bool {
        match self.quote {
            Some(open) => {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == open {
                    self.quote = None;
                }
                true
            }
            None if ch == '\'' || ch == '"' => {
                self.quote = Some(ch);
                true
            }
            None => false,
        }
    }

    pub fn in_quotes(&self) -> bool {
        self.quote.is_some()
    }
}

/// A run of text that is either entirely inside or entirely outside quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub quoted: bool,
}

/// Splits `s` into alternating quoted and unquoted segments.
pub fn segments(s: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut scanner = QuoteScanner::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (i, ch) in s.char_indices() {
        let quoted = scanner.step(ch);
        match current {
            Some(state) if state == quoted => {}
            Some(state) => {
                out.push(Segment {
                    text: &s[start..i],
                    quoted: state,
                });
                start = i;
                current = Some(quoted);
            }
            None => current = Some(quoted),
        }
    }
    if let Some(state) = current {
        out.push(Segment {
            text: &s[start..],
            quoted: state,
        });
    }
    out
}

/// Applies `f` to every unquoted segment and stitches the line back together.
pub fn map_unquoted(s: &str, mut f: impl FnMut(&str) -> String) -> String {
    segments(s)
        .into_iter()
        .map(|seg| {
            if seg.quoted {
                seg.text.to_string()
            } else {
                f(seg.text)
            }
        })
        .collect()
}

/// Byte index of the first occurrence of `pat` that starts outside quotes.
pub fn find_outside_quotes(s: &str, pat: &str) -> Option<usize> {
    let mut scanner = QuoteScanner::new();
    for (i, ch) in s.char_indices() {
        if scanner.step(ch) {
            continue;
        }
        if s[i..].starts_with(pat) {
            return Some(i);
        }
    }
    None
}

/// Splits on every occurrence of `pat` outside quotes.
pub fn split_outside_quotes<'a>(s: &'a str, pat: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(idx) = find_outside_quotes(rest, pat) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + pat.len()..];
    }
    parts.push(rest);
    parts
}

/// Byte index of the first `target` at bracket depth 0, outside quotes.
pub fn find_top_level(s: &str, target: char) -> Option<usize> {
    let mut scanner = QuoteScanner::new();
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        if scanner.step(ch) {
            continue;
        }
        match ch {
            c if c == target && depth == 0 => return Some(i),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Splits on `sep` at bracket depth 0, outside quotes.
pub fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(idx) = find_top_level(rest, sep) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// Byte index of the first top-level `:` that does not close a pending
/// `cond ? a : b`. `??` is not a ternary marker.
pub fn find_unpaired_colon(s: &str) -> Option<usize> {
    let mut scanner = QuoteScanner::new();
    let mut depth = 0usize;
    let mut pending = 0usize;
    let mut chars = s.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if scanner.step(ch) {
            continue;
        }
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '?' if depth == 0 => {
                if chars.peek().is_some_and(|&(_, next)| next == '?') {
                    chars.next();
                } else {
                    pending += 1;
                }
            }
            ':' if depth == 0 => match pending.checked_sub(1) {
                Some(rest) => pending = rest,
                None => return Some(i),
            },
            _ => {}
        }
    }
    None
}

/// Splits a header line at its delimiter: the first top-level `:` that is
/// not part of a ternary. Returns the header and whatever follows it.
pub fn split_header(line: &str) -> Option<(&str, &str)> {
    let idx = find_unpaired_colon(line)?;
    Some((&line[..idx], &line[idx + 1..]))
}

/// Index of the `}` closing the `{` at `open`, skipping quoted text.
pub fn matching_brace(s: &str, open: usize) -> Option<usize> {
    let mut scanner = QuoteScanner::new();
    let mut depth = 0usize;
    for (i, ch) in s[open..].char_indices() {
        if scanner.step(ch) {
            continue;
        }
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the bracket closing the `(`, `[` or `{` at `open`.
pub fn matching_bracket(s: &str, open: usize) -> Option<usize> {
    let mut scanner = QuoteScanner::new();
    let mut depth = 0usize;
    for (i, ch) in s[open..].char_indices() {
        if scanner.step(ch) {
            continue;
        }
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

pub fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// True when `s` is a single identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

/// Leading whitespace of a line, verbatim.
pub fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_alternate() {
        let segs = segments(r#"a && "b && c" || 'd'"#);
        let quoted: Vec<_> = segs.iter().map(|s| (s.text, s.quoted)).collect();
        assert_eq!(
            quoted,
            vec![
                ("a && ", false),
                ("\"b && c\"", true),
                (" || ", false),
                ("'d'", true),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_stays_inside_string() {
        let segs = segments(r#""say \"hi\"" x"#);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, r#""say \"hi\"""#);
        assert_eq!(segs[1].text, " x");
    }

    #[test]
    fn test_find_outside_quotes() {
        assert_eq!(find_outside_quotes("'==>' ==> 1", "==>"), Some(6));
        assert_eq!(find_outside_quotes("'==>'", "==>"), None);
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        assert_eq!(
            split_top_level("a, f(b, c), {d, e}, 'x,y'", ','),
            vec!["a", " f(b, c)", " {d, e}", " 'x,y'"]
        );
    }

    #[test]
    fn test_split_header_skips_slices_and_strings() {
        assert_eq!(
            split_header("if xs[1:2] == ':' then: go()"),
            Some(("if xs[1:2] == ':' then", " go()"))
        );
        assert_eq!(split_header("no delimiter"), None);
    }

    #[test]
    fn test_split_header_skips_ternary_colons() {
        assert_eq!(
            split_header("if a ? b : c then: go()"),
            Some(("if a ? b : c then", " go()"))
        );
        assert_eq!(
            split_header("if x ?? y then:"),
            Some(("if x ?? y then", ""))
        );
        assert_eq!(find_unpaired_colon("a ? b ? 1 : 2 : 3"), None);
    }

    #[test]
    fn test_matching_brace() {
        let s = "{1, {2, '}'}, 3} tail";
        assert_eq!(matching_brace(s, 0), Some(15));
        assert_eq!(matching_brace("{1, 2", 0), None);
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("_name1"));
        assert!(!is_identifier("42lol"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
        assert_eq!(indentation("\t  x = 1"), "\t  ");
    }
}
