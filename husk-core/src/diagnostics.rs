use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Known-cause categories for external tool failures.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFault {
    MissingBinary,
    PermissionDenied,
    DaemonUnavailable,
    ConnectionRefused,
    DiskFull,
    Unknown,
}

impl Display for ToolFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ToolFault::MissingBinary => write!(f, "missing binary"),
            ToolFault::PermissionDenied => write!(f, "permission denied"),
            ToolFault::DaemonUnavailable => write!(f, "daemon unavailable"),
            ToolFault::ConnectionRefused => write!(f, "connection refused"),
            ToolFault::DiskFull => write!(f, "disk full"),
            ToolFault::Unknown => write!(f, "unknown cause"),
        }
    }
}

/// First matching pattern wins; keep the more specific substrings first.
const FAULT_PATTERNS: &[(&str, ToolFault)] = &[
    ("command not found", ToolFault::MissingBinary),
    ("no such file or directory", ToolFault::MissingBinary),
    ("permission denied", ToolFault::PermissionDenied),
    ("operation not permitted", ToolFault::PermissionDenied),
    ("no space left on device", ToolFault::DiskFull),
    ("connection refused", ToolFault::ConnectionRefused),
    ("daemon", ToolFault::DaemonUnavailable),
];

/// Maps raw tool stderr to a closed cause category. Pure and table-driven so
/// it can be tested without ever running the tool.
pub fn classify_tool_stderr(stderr: &str) -> ToolFault {
    let lower = stderr.to_ascii_lowercase();
    FAULT_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, fault)| *fault)
        .unwrap_or(ToolFault::Unknown)
}
