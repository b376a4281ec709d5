//! Single-line statements: return/yield, collection mutation, print, access
//! sugar and assignment.

use lazy_static::lazy_static;
use regex::Regex;

use super::{check_targets, RuleResult, RuleViolation};
use crate::syntax::{
    access::{self, compound_name, uses_access_sugar},
    expression,
    scan::{find_outside_quotes, split_outside_quotes, split_top_level, QuoteScanner},
};

lazy_static! {
    static ref RETURN_YIELD: Regex =
        Regex::new(r"^(return|yield)\b\s*(.*)$").expect("valid pattern");
    static ref MUTATION: Regex =
        Regex::new(r"^([A-Za-z_][\w.]*)\s*:\s*([A-Za-z_]\w*)\s*\[\((.*)\)\]$")
            .expect("valid pattern");
    static ref PRINT_CALL: Regex = Regex::new(r"^zncv\.\[\((.*)\)\]$").expect("valid pattern");
    static ref PRINT_WORD: Regex = Regex::new(r"^print\s+([^\s=(].*)$").expect("valid pattern");
    static ref DECLARATION: Regex =
        Regex::new(r"^(?:let|var|const)\s+([^=]+?)\s*=\s*(.+)$").expect("valid pattern");
    static ref DECLARATION_START: Regex = Regex::new(r"^(?:let|var|const)\s").expect("valid pattern");
}

pub(super) fn return_yield(line: &str) -> RuleResult {
    let Some(caps) = RETURN_YIELD.captures(line) else {
        return Ok(None);
    };
    let keyword = &caps[1];
    let value = caps[2].trim();
    if value.is_empty() {
        return Ok(Some(keyword.to_string()));
    }
    if keyword == "yield" {
        if let Some(source) = value.strip_prefix("from ") {
            return Ok(Some(format!("yield from {}", expression(source))));
        }
    }
    Ok(Some(format!("{keyword} {}", expression(value))))
}

/// `numbers:apend[(4)]` to `numbers.append(4)`. Any method name is
/// accepted; `apend` is the dialect spelling of `append`.
pub(super) fn mutation(line: &str) -> RuleResult {
    let Some(caps) = MUTATION.captures(line) else {
        return Ok(None);
    };
    let method = match &caps[2] {
        "apend" => "append",
        other => other,
    };
    Ok(Some(format!(
        "{}.{}({})",
        &caps[1],
        method,
        expression(&caps[3])
    )))
}

pub(super) fn print(line: &str) -> RuleResult {
    if let Some(caps) = PRINT_CALL.captures(line) {
        return Ok(Some(format!("print({})", expression(&caps[1]))));
    }
    if line.starts_with("zncv.") {
        return Err(RuleViolation::new(
            "malformed print statement; expected `zncv.[(...)]`",
        ));
    }
    Ok(PRINT_WORD
        .captures(line)
        .map(|caps| format!("print({})", expression(&caps[1]))))
}

/// Lines using `~` or `{{ }}`. On an assignment, a pure tilde chain on the
/// left names a single variable (`a~b` becomes `a_b`).
pub(super) fn access(line: &str) -> RuleResult {
    if !uses_access_sugar(line) {
        return Ok(None);
    }
    let Some((target, value)) = split_assignment(line) else {
        return Ok(Some(expression(line)));
    };
    let target = target.trim();
    let target = compound_name(target).unwrap_or_else(|| access::rewrite(target));
    if target.is_empty() {
        return Err(RuleViolation::new("missing assignment target"));
    }
    if value.trim().is_empty() {
        return Err(RuleViolation::new("missing value after assignment"));
    }
    Ok(Some(format!("{target} = {}", expression(value))))
}

/// `a ==> b ==> value`, `x, y ==> pair`, and `let`/`var`/`const` declarations.
pub(super) fn assignment(line: &str) -> RuleResult {
    if DECLARATION_START.is_match(line) {
        let caps = DECLARATION
            .captures(line)
            .ok_or_else(|| RuleViolation::new("declaration needs `name = value`"))?;
        let targets = parse_targets(&caps[1])?;
        return Ok(Some(format!("{targets} = {}", expression(&caps[2]))));
    }
    if find_outside_quotes(line, "==>").is_none() {
        return Ok(None);
    }

    let mut parts = split_outside_quotes(line, "==>");
    let value = parts.pop().unwrap_or_default().trim();
    if value.is_empty() {
        return Err(RuleViolation::new("missing value after `==>`"));
    }
    let targets = parts
        .into_iter()
        .map(parse_targets)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(format!("{} = {}", targets.join(" = "), expression(value))))
}

/// Validates one assignment target list: names, attributes, subscripts,
/// or tuples of those.
fn parse_targets(raw: &str) -> Result<String, RuleViolation> {
    let raw = raw.trim();
    match check_targets(raw) {
        Ok(()) => Ok(split_top_level(raw, ',')
            .into_iter()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(", ")
            .trim_end()
            .to_string()),
        Err("") => Err(RuleViolation::new("missing assignment target")),
        Err(name) if name.starts_with(|c: char| c.is_ascii_digit()) => {
            Err(RuleViolation::new(format!("invalid variable name '{name}'")))
        }
        Err(name) => Err(RuleViolation::new(format!("invalid assignment target '{name}'"))),
    }
}

/// Splits at `==>`, or else at a lone `=` that is not part of a comparison
/// or augmented operator.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    if let Some(idx) = find_outside_quotes(line, "==>") {
        return Some((&line[..idx], &line[idx + 3..]));
    }
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut scanner = QuoteScanner::new();
    let mut depth = 0usize;
    for (pos, &(idx, ch)) in chars.iter().enumerate() {
        if scanner.step(ch) {
            continue;
        }
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => {
                let prev = pos.checked_sub(1).map(|p| chars[p].1);
                let next = chars.get(pos + 1).map(|&(_, c)| c);
                let compound = prev.is_some_and(|p| "=!<>+-*/%&|^:@".contains(p));
                if !compound && next != Some('=') {
                    return Some((&line[..idx], &line[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_and_yield() {
        assert_eq!(return_yield("return").unwrap().unwrap(), "return");
        assert_eq!(
            return_yield("return a ? b : c").unwrap().unwrap(),
            "return b if a else c"
        );
        assert_eq!(
            return_yield("yield from {1, 2}").unwrap().unwrap(),
            "yield from [1, 2]"
        );
        assert_eq!(return_yield("returned ==> 1").unwrap(), None);
    }

    #[test]
    fn test_mutation() {
        assert_eq!(
            mutation("numbers:apend[(4)]").unwrap().unwrap(),
            "numbers.append(4)"
        );
        assert_eq!(
            mutation("items:extend[({5, 6})]").unwrap().unwrap(),
            "items.extend([5, 6])"
        );
        assert_eq!(
            mutation("xs:insert[(0, first)]").unwrap().unwrap(),
            "xs.insert(0, first)"
        );
        assert_eq!(mutation("xs ==> 1").unwrap(), None);
    }

    #[test]
    fn test_print_forms() {
        assert_eq!(print("zncv.[(x)]").unwrap().unwrap(), "print(x)");
        assert_eq!(
            print("zncv.[('Hello $s!' $name)]").unwrap().unwrap(),
            "print(f'Hello {name}!')"
        );
        assert_eq!(print("print 'hi'").unwrap().unwrap(), "print('hi')");
        assert_eq!(print("print('hi')").unwrap(), None);
        assert_eq!(print("print ==> 1").unwrap(), None);
    }

    #[test]
    fn test_malformed_print() {
        let err = print("zncv.[(x)").unwrap_err();
        assert!(err.message.starts_with("malformed print statement"));
    }

    #[test]
    fn test_access_assignment() {
        assert_eq!(
            access("second~name ==> user~name").unwrap().unwrap(),
            "second_name = user.name"
        );
        assert_eq!(
            access("grid{{0}}{{1}} = cell~value").unwrap().unwrap(),
            "grid[0][1] = cell.value"
        );
        assert_eq!(
            access("total ==> prices{{i}} * qty").unwrap().unwrap(),
            "total = prices[i] * qty"
        );
    }

    #[test]
    fn test_access_expression_statement() {
        assert_eq!(access("user~save()").unwrap().unwrap(), "user.save()");
        assert_eq!(
            access("if_ok = a~b == c").unwrap().unwrap(),
            "if_ok = a.b == c"
        );
        assert_eq!(access("plain ==> 1").unwrap(), None);
    }

    #[test]
    fn test_arrow_assignment() {
        assert_eq!(assignment("x ==> 5").unwrap().unwrap(), "x = 5");
        assert_eq!(
            assignment("a ==> b ==> 0").unwrap().unwrap(),
            "a = b = 0"
        );
        assert_eq!(
            assignment("x, y ==> y, x").unwrap().unwrap(),
            "x, y = y, x"
        );
        assert_eq!(
            assignment("flag ==> a && !b").unwrap().unwrap(),
            "flag = a and not b"
        );
    }

    #[test]
    fn test_attribute_and_subscript_targets() {
        assert_eq!(assignment("this.r ==> r").unwrap().unwrap(), "this.r = r");
        assert_eq!(
            assignment("grid[0], self.total ==> row, 0").unwrap().unwrap(),
            "grid[0], self.total = row, 0"
        );
        assert_eq!(
            assignment("first, *rest ==> items").unwrap().unwrap(),
            "first, *rest = items"
        );
    }

    #[test]
    fn test_declarations() {
        assert_eq!(assignment("let x = {}").unwrap().unwrap(), "x = []");
        assert_eq!(
            assignment("const LIMIT = 10").unwrap().unwrap(),
            "LIMIT = 10"
        );
        assert!(assignment("let = 3").is_err());
    }

    #[test]
    fn test_invalid_targets() {
        let err = assignment("42lol ==> 2").unwrap_err();
        assert_eq!(err.message, "invalid variable name '42lol'");
        let err = assignment("a-b ==> 2").unwrap_err();
        assert_eq!(err.message, "invalid assignment target 'a-b'");
        assert!(assignment("x ==>").is_err());
    }

    #[test]
    fn test_non_assignment_lines() {
        assert_eq!(assignment("x = 5").unwrap(), None);
        assert_eq!(assignment("s ==  '==>'").unwrap(), None);
    }
}
