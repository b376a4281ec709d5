//! Text-level building blocks shared by the rule table and the line processor.
//!
//! Nothing here knows about statements. `scan` provides quote- and
//! bracket-aware searching, `expr` rewrites expressions, `access` handles the
//! `~` / `{{ }}` sugar, and `keywords` normalizes literal spellings.

pub mod access;
pub mod expr;
pub mod keywords;
pub mod scan;

use lazy_static::lazy_static;

pub use keywords::KeywordNormalizer;

lazy_static! {
    static ref NORMALIZER: KeywordNormalizer = KeywordNormalizer::new();
}

/// Rewrites an expression fragment: access sugar first, then the expression
/// converter passes.
pub fn expression(fragment: &str) -> String {
    expr::convert_with(&access::rewrite(fragment.trim()), &placeholder)
}

/// Code inside an interpolated string; keywords are normalized here because
/// the line-level normalizer never looks inside string literals.
fn placeholder(code: &str) -> String {
    NORMALIZER.normalize(&expression(code))
}
