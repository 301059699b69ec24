//! Lexical style counter.
//!
//! Three independent patterns are run over the whole document. They are not
//! mutually exclusive: a span satisfying two patterns is counted by both.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// ASCII-only word boundary; a non-ASCII letter does not join an identifier.
const BOUNDARY: &str = r"(?-u:\b)";

/// Whitespace as ECMAScript defines it: `U+FEFF` included, `U+0085` excluded.
const SPACE: &str =
    r"[\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]";

/// Any character except a line terminator.
const LINE_CHAR: &str = r"[^\n\r\x{2028}\x{2029}]";

/// Loose assignment: `name = value;`.
static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{BOUNDARY}[a-z][a-zA-Z0-9]*{SPACE}*={SPACE}*[^;]+;"
    ))
    .expect("static regex")
});

/// Uppercase constant: `const NAME = value;`.
static CONST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{BOUNDARY}const{SPACE}+[A-Z_]+{SPACE}*={SPACE}*[^;]+;"
    ))
    .expect("static regex")
});

// The argument list is greedy and never crosses a line terminator, so nested
// or multi-line signatures are miscounted on purpose.
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{BOUNDARY}[a-z][a-zA-Z0-9]*{SPACE}*\({LINE_CHAR}*\){SPACE}*\{{"
    ))
    .expect("static regex")
});

/// Per-pattern match counts for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    pub variable_matches: usize,
    pub const_matches: usize,
    pub function_matches: usize,
}

impl MatchCounts {
    pub fn total_matches(&self) -> usize {
        self.variable_matches + self.const_matches + self.function_matches
    }
}

/// Count non-overlapping matches of each pattern in `text`.
pub fn count(text: &str) -> MatchCounts {
    MatchCounts {
        variable_matches: VARIABLE_RE.find_iter(text).count(),
        const_matches: CONST_RE.find_iter(text).count(),
        function_matches: FUNCTION_RE.find_iter(text).count(),
    }
}
