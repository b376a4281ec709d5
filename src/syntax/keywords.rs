//! Whole-word keyword normalization applied to every emitted code line.

use super::scan::{find_outside_quotes, is_ident_char, map_unquoted};

/// Dialect spellings and their target equivalents.
pub const KEYWORDS: &[(&str, &str)] = &[
    ("true", "True"),
    ("false", "False"),
    ("null", "None"),
    ("none", "None"),
    ("nil", "None"),
    ("this", "self"),
    ("AND", "and"),
    ("OR", "or"),
    ("NOT", "not"),
];

#[derive(Debug, Clone)]
pub struct KeywordNormalizer {
    table: Vec<(&'static str, &'static str)>,
}

impl Default for KeywordNormalizer {
    fn default() -> Self {
        Self {
            table: KEYWORDS.to_vec(),
        }
    }
}

impl KeywordNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whole-word keywords outside strings. A trailing `#` comment
    /// and attribute names after `.` are left as written.
    pub fn normalize(&self, line: &str) -> String {
        let (code, comment) = match find_outside_quotes(line, "#") {
            Some(idx) => line.split_at(idx),
            None => (line, ""),
        };
        let mut out = map_unquoted(code, |seg| self.normalize_segment(seg));
        out.push_str(comment);
        out
    }

    fn lookup(&self, word: &str) -> Option<&'static str> {
        self.table
            .iter()
            .find(|(from, _)| *from == word)
            .map(|(_, to)| *to)
    }

    fn normalize_segment(&self, seg: &str) -> String {
        let mut out = String::with_capacity(seg.len());
        let mut word = String::new();
        let mut prev: Option<char> = None;
        let mut word_prev: Option<char> = None;

        let flush = |word: &mut String, before: Option<char>, out: &mut String| {
            if word.is_empty() {
                return;
            }
            match self.lookup(word) {
                Some(to) if before != Some('.') => out.push_str(to),
                _ => out.push_str(word),
            }
            word.clear();
        };

        for ch in seg.chars() {
            if is_ident_char(ch) {
                if word.is_empty() {
                    word_prev = prev;
                }
                word.push(ch);
            } else {
                flush(&mut word, word_prev, &mut out);
                out.push(ch);
            }
            prev = Some(ch);
        }
        flush(&mut word, word_prev, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_normalized() {
        let k = KeywordNormalizer::new();
        assert_eq!(k.normalize("x = true"), "x = True");
        assert_eq!(k.normalize("y = null or nil or none"), "y = None or None or None");
        assert_eq!(k.normalize("if a AND NOT b:"), "if a and not b:");
    }

    #[test]
    fn test_whole_words_only() {
        let k = KeywordNormalizer::new();
        assert_eq!(k.normalize("is_true = untrue"), "is_true = untrue");
        assert_eq!(k.normalize("this_one = this"), "this_one = self");
    }

    #[test]
    fn test_strings_attributes_and_comments_untouched() {
        let k = KeywordNormalizer::new();
        assert_eq!(k.normalize("s = 'true'"), "s = 'true'");
        assert_eq!(k.normalize("obj.none = false"), "obj.none = False");
        assert_eq!(k.normalize("x = 1  # true story"), "x = 1  # true story");
    }
}
