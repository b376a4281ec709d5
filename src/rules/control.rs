//! Block headers: conditionals, loops and exception handling.

use lazy_static::lazy_static;
use regex::Regex;

use super::{check_targets, RuleResult, RuleTable, RuleViolation};
use crate::syntax::{access, expression, scan::split_header};

lazy_static! {
    static ref CONTROL_START: Regex = Regex::new(r"^(if|elif|else|for|while)\b").expect("valid pattern");
    static ref ELSE_IF: Regex = Regex::new(r"^else\s+if\b\s*(.*?)(?:\s+then)?$").expect("valid pattern");
    static ref IF: Regex = Regex::new(r"^(if|elif)\b\s*(.*?)(?:\s+then)?$").expect("valid pattern");
    static ref FOR: Regex = Regex::new(r"^for\s+(.+?)\s+in\s+(.+?)(?:\s+do)?$").expect("valid pattern");
    static ref WHILE: Regex = Regex::new(r"^while\b\s*(.*?)(?:\s+do)?$").expect("valid pattern");
    static ref EXCEPTION_START: Regex =
        Regex::new(r"^(try|catch|except|finally|throw|raise)\b").expect("valid pattern");
    static ref RAISE: Regex = Regex::new(r"^(?:throw|raise)\b\s*(.*)$").expect("valid pattern");
    static ref TYPED_CATCH: Regex =
        Regex::new(r"^([A-Za-z_][\w.]*)\s+([A-Za-z_]\w*)$").expect("valid pattern");
}

// ============================================================================
// CONDITIONALS AND LOOPS
// ============================================================================

pub(super) fn control_flow(line: &str, table: &RuleTable) -> RuleResult {
    let Some(keyword) = CONTROL_START.captures(line).map(|c| c[1].to_string()) else {
        return Ok(None);
    };
    let Some((head, body)) = split_header(line) else {
        return Err(RuleViolation::new(format!(
            "`{keyword}` header must end with `:`"
        )));
    };
    let head = head.trim();

    let header = if let Some(caps) = ELSE_IF.captures(head) {
        format!("elif {}:", condition(&caps[1])?)
    } else if head == "else" {
        "else:".to_string()
    } else if let Some(caps) = IF.captures(head) {
        format!("{} {}:", &caps[1], condition(&caps[2])?)
    } else if let Some(caps) = FOR.captures(head) {
        format!("for {} in {}:", loop_targets(&caps[1])?, expression(&caps[2]))
    } else if let Some(caps) = WHILE.captures(head) {
        format!("while {}:", condition(&caps[1])?)
    } else {
        return Err(RuleViolation::new(format!("malformed `{keyword}` header")));
    };
    table.with_inline_body(header, body)
}

fn condition(raw: &str) -> Result<String, RuleViolation> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RuleViolation::new("missing condition"));
    }
    Ok(expression(raw))
}

fn loop_targets(raw: &str) -> Result<String, RuleViolation> {
    let targets = access::rewrite(raw.trim());
    match check_targets(&targets) {
        Ok(()) => Ok(targets),
        Err(bad) => Err(RuleViolation::new(format!("invalid loop variable '{bad}'"))),
    }
}

// ============================================================================
// EXCEPTIONS
// ============================================================================

pub(super) fn exception(line: &str, table: &RuleTable) -> RuleResult {
    let Some(keyword) = EXCEPTION_START.captures(line).map(|c| c[1].to_string()) else {
        return Ok(None);
    };
    if let Some(caps) = RAISE.captures(line) {
        let value = caps[1].trim();
        return Ok(Some(if value.is_empty() {
            "raise".to_string()
        } else {
            format!("raise {}", expression(value))
        }));
    }

    let Some((head, body)) = split_header(line) else {
        return Err(RuleViolation::new(format!(
            "`{keyword}` header must end with `:`"
        )));
    };
    let rest = head.trim()[keyword.len()..].trim();

    let header = match keyword.as_str() {
        "try" | "finally" if rest.is_empty() => format!("{keyword}:"),
        "catch" | "except" => handler(rest),
        _ => return Err(RuleViolation::new(format!("malformed `{keyword}` header"))),
    };
    table.with_inline_body(header, body)
}

/// `catch`, `catch E`, `catch (E err)`, `catch E err`, `catch E as err`.
/// Anything else, such as a parenthesized tuple of types, is kept verbatim.
fn handler(rest: &str) -> String {
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .map(str::trim);
    if rest.is_empty() || inner == Some("") {
        return "except:".to_string();
    }
    let typed = inner.unwrap_or(rest);
    match TYPED_CATCH.captures(typed) {
        Some(caps) if &caps[2] != "as" => format!("except {} as {}:", &caps[1], &caps[2]),
        _ => format!("except {}:", expression(rest)),
    }
}
