//! Human-readable introspection tables over currently held locks.

use std::collections::HashMap;

use crate::boundary::AnyBoundaryId;
use crate::info::LockmanInfo;

/// Verbosity of [`DebugTable::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugFormat {
    /// Boundary, action id, unique id.
    #[default]
    Default,
    /// One line per boundary, locks summarized by count.
    Compact,
    /// Everything `Default` shows, plus each record's `debug_description`.
    Detailed,
}

/// Renders a box-drawing-character table of currently held locks, grouped by
/// strategy label then boundary.
pub struct DebugTable;

impl DebugTable {
    pub fn render<I: LockmanInfo>(
        strategies: &[(&str, &HashMap<AnyBoundaryId, Vec<I>>)],
        format: DebugFormat,
    ) -> String {
        let mut out = String::new();
        out.push_str("┌─ Lockman state ────────────────────────────────────\n");
        for (label, locks) in strategies {
            if locks.is_empty() {
                out.push_str(&format!("│ {label}: (no active locks)\n"));
                continue;
            }
            match format {
                DebugFormat::Compact => {
                    for (boundary, records) in locks.iter() {
                        out.push_str(&format!("│ {label} · {boundary}: {} active\n", records.len()));
                    }
                }
                DebugFormat::Default | DebugFormat::Detailed => {
                    out.push_str(&format!("│ {label}\n"));
                    for (boundary, records) in locks.iter() {
                        out.push_str(&format!("│ ├─ {boundary}\n"));
                        for record in records {
                            out.push_str(&format!(
                                "│ │  ├─ action={} unique_id={}\n",
                                record.action_id(),
                                record.unique_id()
                            ));
                            if format == DebugFormat::Detailed {
                                out.push_str(&format!("│ │  │    {}\n", record.debug_description()));
                            }
                        }
                    }
                }
            }
        }
        out.push_str("└────────────────────────────────────────────────────\n");
        out
    }
}
