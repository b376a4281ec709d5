use lazy_static::lazy_static;
use regex::Regex;

use super::{RuleResult, RuleViolation};

lazy_static! {
    static ref IMPORT: Regex =
        Regex::new(r"^zen\[\s*(?:import|imoprt)\s+([A-Za-z_][\w.]*)\s*\]$").expect("valid pattern");
    static ref IMPORT_ALIAS: Regex = Regex::new(
        r"^zen\[\s*(?:import|imoprt)\s+([A-Za-z_][\w.]*)\s+from\s+as\s+([A-Za-z_]\w*)\s*\]$"
    )
    .expect("valid pattern");
}

/// `zen[import m]`, `zen[import m from as a]`, `zen[import a.b from as c]`.
/// The misspelling `imoprt` is accepted.
pub(super) fn import(line: &str) -> RuleResult {
    if !line.starts_with("zen[") {
        return Ok(None);
    }
    if let Some(caps) = IMPORT.captures(line) {
        return Ok(Some(format!("import {}", &caps[1])));
    }
    if let Some(caps) = IMPORT_ALIAS.captures(line) {
        let (module, alias) = (&caps[1], &caps[2]);
        let target = match module.rsplit_once('.') {
            Some((parent, member)) if !parent.is_empty() && !member.is_empty() => {
                format!("from {parent} import {member} as {alias}")
            }
            _ => format!("import {module} as {alias}"),
        };
        return Ok(Some(target));
    }
    Err(RuleViolation::new(
        "malformed import; expected `zen[import module]` or `zen[import module from as alias]`",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_import() {
        assert_eq!(import("zen[import math]").unwrap().unwrap(), "import math");
        assert_eq!(import("zen[imoprt os.path]").unwrap().unwrap(), "import os.path");
    }

    #[test]
    fn test_aliased_imports() {
        assert_eq!(
            import("zen[import numpy from as np]").unwrap().unwrap(),
            "import numpy as np"
        );
        assert_eq!(
            import("zen[import collections.OrderedDict from as OD]")
                .unwrap()
                .unwrap(),
            "from collections import OrderedDict as OD"
        );
    }

    #[test]
    fn test_not_an_import() {
        assert_eq!(import("zenith ==> 1").unwrap(), None);
    }

    #[test]
    fn test_malformed_import() {
        assert!(import("zen[import]").is_err());
        assert!(import("zen[import a b c]").is_err());
    }
}
