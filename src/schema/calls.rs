//! Call facts - best-effort syntactic call edges
//!
//! Callee labels are syntactic (e.g. `client.fetch` for a simple local
//! receiver), not symbol-resolved. This is an accepted approximation.

use serde::{Deserialize, Serialize};

/// A single observed call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    /// Enclosing function of the call site
    pub caller: String,
    /// Syntactic label of the called function
    pub callee: String,
    pub origin_file: String,
    pub origin_line: u32,
}

impl CallEdge {
    pub fn new(
        caller: impl Into<String>,
        callee: impl Into<String>,
        origin_file: impl Into<String>,
        origin_line: u32,
    ) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
            origin_file: origin_file.into(),
            origin_line,
        }
    }
}

impl std::fmt::Display for CallEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({}:{})",
            self.caller, self.callee, self.origin_file, self.origin_line
        )
    }
}
