//! # Expression Converter
//!
//! Rewrites the value/condition part of a statement. The passes run in a
//! fixed order so that no pass sees text another pass has not finished with:
//!
//! 1. brace collection literals to `[...]` (mapping literals keep their braces)
//! 2. `&&`, `||`, unary `!` to `and`, `or`, `not`
//! 3. `??` to `or`
//! 4. `cond ? a : b` to `a if cond else b`, inside brackets too
//! 5. interpolated strings (`'... $s' $name`, `"... #{expr}"`) to f-strings
//!
//! The converter knows nothing about statements; it never fails and returns
//! its input unchanged when nothing applies. Interpolated placeholders are
//! handed to a caller-supplied converter so they get the same treatment as
//! the code around the string.

use lazy_static::lazy_static;
use regex::Regex;

use super::scan::{
    find_top_level, find_unpaired_colon, is_identifier, map_unquoted, matching_brace,
    matching_bracket, segments, split_top_level, QuoteScanner,
};

lazy_static! {
    static ref DOLLAR_VARS: Regex =
        Regex::new(r"^(?:\s*,?\s*\$\s*[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)+")
            .expect("valid pattern");
    static ref DOLLAR_VAR: Regex =
        Regex::new(r"\$\s*([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)").expect("valid pattern");
    static ref NUMBER: Regex = Regex::new(r"^-?[0-9][0-9_]*(?:\.[0-9_]+)?$").expect("valid pattern");
}

/// Runs all five passes over `expr`, copying placeholders verbatim.
pub fn convert(expr: &str) -> String {
    convert_with(expr, &|code: &str| code.to_string())
}

/// Runs all five passes, rewriting every interpolated placeholder with
/// `placeholder`.
pub fn convert_with(expr: &str, placeholder: &dyn Fn(&str) -> String) -> String {
    let out = convert_braces(expr);
    let out = convert_logical(&out);
    let out = convert_coalescing(&out);
    let out = convert_ternary(&out);
    convert_interpolation(&out, placeholder)
}

// ============================================================================
// PASS 1: BRACE COLLECTIONS
// ============================================================================

/// Converts `{...}` regions outside strings, innermost first.
pub fn convert_braces(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut scanner = QuoteScanner::new();
    let mut i = 0;
    while let Some(ch) = expr[i..].chars().next() {
        if !scanner.step(ch) && ch == '{' {
            if let Some(close) = matching_brace(expr, i) {
                let inner = convert_braces(&expr[i + 1..close]);
                if is_mapping(&inner) {
                    out.push('{');
                    out.push_str(&inner);
                    out.push('}');
                } else {
                    out.push('[');
                    out.push_str(&inner);
                    out.push(']');
                }
                i = close + 1;
                continue;
            }
        }
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// A region is a mapping when one of its top-level entries is `key: value`
/// with a quoted, identifier or numeric key, or a `**spread`.
fn is_mapping(inner: &str) -> bool {
    split_top_level(inner, ',').into_iter().any(|entry| {
        let entry = entry.trim();
        if entry.starts_with("**") {
            return true;
        }
        let Some(colon) = find_top_level(entry, ':') else {
            return false;
        };
        looks_like_key(entry[..colon].trim())
    })
}

fn looks_like_key(key: &str) -> bool {
    let quoted = key.len() >= 2
        && (key.starts_with('\'') && key.ends_with('\'')
            || key.starts_with('"') && key.ends_with('"'));
    quoted || is_identifier(key) || NUMBER.is_match(key)
}

// ============================================================================
// PASS 2 + 3: OPERATORS
// ============================================================================

pub fn convert_logical(expr: &str) -> String {
    map_unquoted(expr, |seg| {
        let seg = spaced_replace(seg, "&&", "and");
        let seg = spaced_replace(&seg, "||", "or");
        convert_bang(&seg)
    })
}

pub fn convert_coalescing(expr: &str) -> String {
    map_unquoted(expr, |seg| spaced_replace(seg, "??", "or"))
}

/// Replaces every `op` with ` word `, normalising the spaces around it.
fn spaced_replace(seg: &str, op: &str, word: &str) -> String {
    let mut out = String::with_capacity(seg.len());
    let mut rest = seg;
    while let Some(idx) = rest.find(op) {
        out.push_str(rest[..idx].trim_end());
        out.push(' ');
        out.push_str(word);
        out.push(' ');
        rest = rest[idx + op.len()..].trim_start();
    }
    out.push_str(rest);
    out
}

/// Unary `!` becomes `not`; `!=` is left alone.
fn convert_bang(seg: &str) -> String {
    let chars: Vec<char> = seg.chars().collect();
    let mut out = String::with_capacity(seg.len() + 8);
    for (i, &ch) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        if ch != '!' || next == Some('=') {
            out.push(ch);
            continue;
        }
        if out
            .chars()
            .last()
            .is_some_and(|c| !c.is_whitespace() && !"([{,".contains(c))
        {
            out.push(' ');
        }
        out.push_str("not");
        if next.is_some_and(|c| !c.is_whitespace()) {
            out.push(' ');
        }
    }
    out
}

// ============================================================================
// PASS 4: TERNARY
// ============================================================================

/// `cond ? a : b` to `a if cond else b`, right-associative. Applied to every
/// comma-separated entry, inside bracket groups as well as at the top level.
pub fn convert_ternary(expr: &str) -> String {
    let expr = ternaries_in_groups(expr);
    split_top_level(&expr, ',')
        .into_iter()
        .map(ternary_entry)
        .collect::<Vec<_>>()
        .join(",")
}

fn ternaries_in_groups(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut scanner = QuoteScanner::new();
    let mut i = 0;
    while let Some(ch) = expr[i..].chars().next() {
        if !scanner.step(ch) && matches!(ch, '(' | '[' | '{') {
            if let Some(close) = matching_bracket(expr, i) {
                out.push(ch);
                out.push_str(&convert_ternary(&expr[i + 1..close]));
                out.push_str(&expr[close..close + 1]);
                i = close + 1;
                continue;
            }
        }
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Converts one entry, keeping its surrounding whitespace. A `key:` or
/// `lambda x:` prefix stays in front of the converted conditional.
fn ternary_entry(entry: &str) -> String {
    let Some(question) = find_top_level(entry, '?') else {
        return entry.to_string();
    };
    if let Some(colon) = find_top_level(&entry[..question], ':') {
        return format!("{}{}", &entry[..=colon], ternary_entry(&entry[colon + 1..]));
    }

    let core = entry.trim();
    let lead = &entry[..entry.len() - entry.trim_start().len()];
    let trail = &entry[entry.trim_end().len()..];
    let Some(question) = find_top_level(core, '?') else {
        return entry.to_string();
    };
    let cond = core[..question].trim();
    let branches = &core[question + 1..];
    let Some(colon) = find_unpaired_colon(branches) else {
        return entry.to_string();
    };
    let when_true = branches[..colon].trim();
    let when_false = branches[colon + 1..].trim();
    if cond.is_empty() || when_true.is_empty() || when_false.is_empty() {
        return entry.to_string();
    }

    let converted_true = ternary_entry(when_true);
    let when_true = if converted_true != when_true {
        format!("({converted_true})")
    } else {
        converted_true
    };
    format!(
        "{lead}{} if {} else {}{trail}",
        when_true,
        cond,
        ternary_entry(when_false)
    )
}

// ============================================================================
// PASS 5: INTERPOLATION
// ============================================================================

/// Rewrites interpolated string literals into f-strings.
pub fn convert_interpolation(expr: &str, placeholder: &dyn Fn(&str) -> String) -> String {
    let segs = segments(expr);
    let mut out = String::with_capacity(expr.len() + 4);
    let mut skip = 0;
    for (index, seg) in segs.iter().enumerate() {
        if !seg.quoted {
            out.push_str(&seg.text[skip.min(seg.text.len())..]);
            skip = 0;
            continue;
        }

        let prefixed = index > 0
            && segs[index - 1]
                .text
                .chars()
                .last()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
        let vars_prefix = segs
            .get(index + 1)
            .filter(|next| !next.quoted)
            .and_then(|next| DOLLAR_VARS.find(next.text))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let vars: Vec<&str> = DOLLAR_VAR
            .captures_iter(vars_prefix)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        match interpolate_literal(seg.text, &vars, placeholder) {
            Some(literal) if !prefixed => {
                out.push_str(&literal);
                skip = vars_prefix.len();
            }
            _ => out.push_str(seg.text),
        }
    }
    out
}

/// Builds the f-string for one closed string literal, or `None` when the
/// literal has no interpolation markers.
fn interpolate_literal(
    literal: &str,
    vars: &[&str],
    placeholder: &dyn Fn(&str) -> String,
) -> Option<String> {
    let quote = literal.chars().next()?;
    if literal.len() < 2 || !literal.ends_with(quote) {
        return None;
    }
    let body = &literal[1..literal.len() - 1];
    if vars.is_empty() && !body.contains("#{") {
        return None;
    }

    let mut pending = vars.iter();
    let mut out = String::with_capacity(body.len() + 8);
    let mut rest = body;
    while let Some(ch) = rest.chars().next() {
        if rest.starts_with("#{") {
            if let Some(close) = matching_brace(rest, 1) {
                out.push('{');
                out.push_str(&placeholder(rest[2..close].trim()));
                out.push('}');
                rest = &rest[close + 1..];
                continue;
            }
        }
        if rest.starts_with("$s") && !vars.is_empty() {
            if let Some(var) = pending.next() {
                out.push('{');
                out.push_str(&placeholder(var));
                out.push('}');
                rest = &rest[2..];
                continue;
            }
        }
        match ch {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            _ => out.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }
    for var in pending {
        out.push_str(" {");
        out.push_str(&placeholder(var));
        out.push('}');
    }
    Some(format!("f{quote}{out}{quote}"))
}
