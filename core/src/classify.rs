//! Read/write classification of raw SQL text.
//!
//! The classifier is a substring heuristic, not a parser. Quoted spans
//! (backtick, single-quote and double-quote delimited) and named
//! placeholders are removed first, then the remainder is searched for any
//! of the [`WRITE_KEYWORDS`].
//!
//! # Known limitation
//!
//! Keyword matching is not word-bounded. A read statement that mentions an
//! unquoted identifier containing a keyword (for example an alias named
//! `created_at`) is classified as [`StatementKind::Write`]. Callers that hit
//! this can quote the identifier.
//!
//! # Example
//!
//! ```
//! use litegate_core::{StatementKind, classify};
//!
//! assert_eq!(classify("INSERT INTO t VALUES (:x)"), StatementKind::Write);
//! assert_eq!(classify("SELECT id FROM users"), StatementKind::Read);
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keywords whose presence marks a statement as a write.
pub const WRITE_KEYWORDS: [&str; 6] = ["CREATE", "UPDATE", "ALTER", "DROP", "INSERT", "DELETE"];

// Greedy within a single line: `'a' || x || 'b'` is stripped as one span.
static STRIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"`(.*)`|'(.*)'|"(.*)"|:[a-zA-Z0-9]+"#).expect("static regex must compile")
});

/// Classification of a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    /// Reads only; runs outside any write transaction.
    Read,
    /// Mutates data or schema; runs inside the batched write transaction.
    Write,
}

impl StatementKind {
    /// Returns `true` for [`StatementKind::Write`].
    pub fn is_write(self) -> bool {
        self == Self::Write
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("READ"),
            Self::Write => f.write_str("WRITE"),
        }
    }
}

/// Classifies `sql` as a read or a write statement.
pub fn classify(sql: &str) -> StatementKind {
    let upper = sql.to_uppercase();
    let stripped = STRIP_RE.replace_all(&upper, "");

    if WRITE_KEYWORDS.iter().any(|key| stripped.contains(key)) {
        StatementKind::Write
    } else {
        StatementKind::Read
    }
}
