use lazy_static::lazy_static;
use regex::Regex;

use super::{RuleResult, RuleTable, RuleViolation};
use crate::syntax::{
    expression,
    scan::{find_top_level, is_identifier, split_header, split_top_level},
};

lazy_static! {
    static ref FUNCTION_START: Regex = Regex::new(r"^(?:function|func)\s").expect("valid pattern");
    static ref FUNCTION: Regex =
        Regex::new(r"^(?:function|func)\s+([A-Za-z_]\w*)\s*\((.*)\)\s*(->\s*.+)?$")
            .expect("valid pattern");
    static ref CLASS: Regex =
        Regex::new(r"^class\s+([A-Za-z_]\w*)\s*(?:extends\s+(.+)|\((.*)\))?$")
            .expect("valid pattern");
}

pub(super) fn function(line: &str, table: &RuleTable) -> RuleResult {
    if !FUNCTION_START.is_match(line) {
        return Ok(None);
    }
    let Some((head, body)) = split_header(line) else {
        return Err(RuleViolation::new("function header must end with `:`"));
    };
    let caps = FUNCTION
        .captures(head.trim())
        .ok_or_else(|| RuleViolation::new("malformed function header"))?;

    let params = parameters(&caps[2]);
    let returns = caps
        .get(3)
        .map(|m| format!(" {}", m.as_str().trim()))
        .unwrap_or_default();
    let header = format!("def {}({}){}:", &caps[1], params, returns);
    table.with_inline_body(header, body)
}

/// Parameter list with `this` as the receiver and converted default values.
fn parameters(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    split_top_level(raw, ',')
        .into_iter()
        .enumerate()
        .map(|(index, param)| {
            let param = param.trim();
            if index == 0 && param == "this" {
                return "self".to_string();
            }
            match find_top_level(param, '=') {
                Some(eq) => format!(
                    "{}={}",
                    param[..eq].trim(),
                    expression(&param[eq + 1..])
                ),
                None => param.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn class(line: &str, table: &RuleTable) -> RuleResult {
    if !line.starts_with("class ") {
        return Ok(None);
    }
    let Some((head, body)) = split_header(line) else {
        return Err(RuleViolation::new("class header must end with `:`"));
    };
    let caps = CLASS
        .captures(head.trim())
        .ok_or_else(|| RuleViolation::new("malformed class header"))?;
    let name = &caps[1];

    let header = if let Some(parent) = caps.get(2) {
        let parent = parent.as_str().trim();
        if parent.contains(',') {
            return Err(RuleViolation::new("a class may extend a single parent"));
        }
        if !parent.split('.').all(is_identifier) {
            return Err(RuleViolation::new(format!("invalid parent class '{parent}'")));
        }
        format!("class {name}({parent}):")
    } else if let Some(bases) = caps.get(3) {
        format!("class {name}({}):", bases.as_str().trim())
    } else {
        format!("class {name}:")
    };
    table.with_inline_body(header, body)
}
