//! Attribute and subscript sugar: `a~b` and `x{{i}}`.

use super::scan::{
    find_outside_quotes, is_ident_char, is_ident_start, is_identifier, map_unquoted,
    matching_brace, QuoteScanner,
};

/// True when the line uses `~` or `{{` outside string literals.
pub fn uses_access_sugar(line: &str) -> bool {
    find_outside_quotes(line, "~").is_some() || find_outside_quotes(line, "{{").is_some()
}

/// Rewrites `a~b` to `a.b` and `x{{i}}` to `x[i]` outside strings.
pub fn rewrite(expr: &str) -> String {
    rewrite_subscripts(&rewrite_tildes(expr))
}

fn rewrite_tildes(expr: &str) -> String {
    map_unquoted(expr, |seg| {
        let chars: Vec<char> = seg.chars().collect();
        chars
            .iter()
            .enumerate()
            .map(|(i, &ch)| {
                let between = i > 0
                    && chars.get(i - 1).copied().is_some_and(is_ident_char)
                    && chars.get(i + 1).copied().is_some_and(is_ident_start);
                if ch == '~' && between {
                    '.'
                } else {
                    ch
                }
            })
            .collect()
    })
}

fn rewrite_subscripts(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut scanner = QuoteScanner::new();
    let mut i = 0;
    while let Some(ch) = expr[i..].chars().next() {
        let quoted = scanner.step(ch);
        if !quoted && expr[i..].starts_with("{{") && follows_subscriptable(&out) {
            if let Some(close) = subscript_close(expr, i) {
                out.push('[');
                out.push_str(&rewrite_subscripts(&expr[i + 2..close - 1]));
                out.push(']');
                i = close + 1;
                continue;
            }
        }
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn follows_subscriptable(out: &str) -> bool {
    out.chars()
        .last()
        .is_some_and(|c| is_ident_char(c) || c == ')' || c == ']')
}

/// Index of the final `}` of the `}}` closing the `{{` at `open`.
fn subscript_close(expr: &str, open: usize) -> Option<usize> {
    let outer = matching_brace(expr, open)?;
    let inner = matching_brace(expr, open + 1)?;
    (inner + 1 == outer).then_some(outer)
}

/// A pure `a~b~c` chain used as an assignment target names one variable,
/// `a_b_c`.
pub fn compound_name(target: &str) -> Option<String> {
    let parts: Vec<&str> = target.trim().split('~').map(str::trim).collect();
    if parts.len() < 2 || !parts.iter().all(|p| is_identifier(p)) {
        return None;
    }
    Some(parts.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilde_access() {
        assert_eq!(rewrite("user~name"), "user.name");
        assert_eq!(rewrite("a~b~c()"), "a.b.c()");
        assert_eq!(rewrite("~x"), "~x");
        assert_eq!(rewrite("'a~b'"), "'a~b'");
    }

    #[test]
    fn test_double_brace_subscript() {
        assert_eq!(rewrite("items{{0}}"), "items[0]");
        assert_eq!(rewrite("grid{{i}}{{j}}"), "grid[i][j]");
        assert_eq!(rewrite("m{{'k'}}"), "m['k']");
        assert_eq!(rewrite("f(){{1}}"), "f()[1]");
        assert_eq!(rewrite("a{{b{{0}}}}"), "a[b[0]]");
    }

    #[test]
    fn test_double_brace_without_subject_untouched() {
        assert_eq!(rewrite("{{1, 2}}"), "{{1, 2}}");
    }

    #[test]
    fn test_compound_name() {
        assert_eq!(compound_name("second~name"), Some("second_name".to_string()));
        assert_eq!(compound_name("plain"), None);
        assert_eq!(compound_name("a~b{{0}}"), None);
    }

    #[test]
    fn test_uses_access_sugar() {
        assert!(uses_access_sugar("x ==> a~b"));
        assert!(uses_access_sugar("x{{0}} ==> 1"));
        assert!(!uses_access_sugar("x ==> '~'"));
    }
}
