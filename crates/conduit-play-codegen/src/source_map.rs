//! Source mapping: host script line → playground source location.
//!
//! One entry is recorded for every emitted statement, at the generated line
//! where its text begins. A sandbox error reported against a host script line
//! resolves to the innermost statement that starts at or before that line.

use conduit_play_types::Span;
use serde::{Deserialize, Serialize};

/// A complete source map for one generated host script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub entries: Vec<SourceMapEntry>,
}

/// A single source map entry: one generated line → one source region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMapEntry {
    /// 1-based line in the generated host script.
    pub generated_line: u32,
    /// Node kind of the statement, e.g. "FunctionDef".
    pub node: String,
    /// Source span (1-based line/column).
    pub span: Span,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, generated_line: u32, node: impl Into<String>, span: Span) {
        self.entries.push(SourceMapEntry {
            generated_line,
            node: node.into(),
            span,
        });
    }

    /// Resolve a generated line to the source span of the statement that
    /// produced it.
    pub fn lookup(&self, generated_line: u32) -> Option<Span> {
        self.entries
            .iter()
            .filter(|e| e.generated_line <= generated_line)
            .max_by_key(|e| e.generated_line)
            .map(|e| e.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_picks_innermost_preceding_statement() {
        let mut sm = SourceMap::new();
        sm.push(1, "FunctionDef", Span::new(1, 1, 3, 10));
        sm.push(2, "ExprStmt", Span::new(2, 5, 2, 12));
        sm.push(3, "Return", Span::new(3, 5, 3, 10));
        sm.push(5, "ExprStmt", Span::new(4, 1, 4, 8));

        assert_eq!(sm.lookup(2).map(|s| s.start_line), Some(2));
        assert_eq!(sm.lookup(4).map(|s| s.start_line), Some(3));
        assert_eq!(sm.lookup(9).map(|s| s.start_line), Some(4));
    }

    #[test]
    fn lookup_before_first_entry_is_none() {
        let mut sm = SourceMap::new();
        sm.push(3, "ExprStmt", Span::new(1, 1, 1, 5));
        assert!(sm.lookup(1).is_none());
        assert!(SourceMap::new().lookup(1).is_none());
    }
}
