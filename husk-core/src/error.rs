use crate::ToolFault;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything the manager can fail with. Each variant maps to a stable
/// classification string via [`HuskError::kind`] so the entry-point boundary
/// can report machine-readable failures without losing the human message.
#[derive(Debug, Error)]
pub enum HuskError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Path(String),

    #[error("no disk image found in {} (looked for: .qcow2, .raw, .img, .vmdk, .vhdx, .vdi); create a disk image, pick an existing disk file, or provide an install medium", .0.display())]
    NoDiskFound(PathBuf),

    #[error("disk image does not exist: {}; create it first or provide an install medium to install from", .0.display())]
    DiskMissingNoMedium(PathBuf),

    #[error("disk image {} looks empty ({1} bytes); provide an install medium to install an operating system, or use a bootable disk image", .0.display())]
    DiskLikelyEmpty(PathBuf, u64),

    #[error("install medium does not exist: {}", .0.display())]
    MediumNotFound(PathBuf),

    #[error("{0} not found; is QEMU installed and in PATH?")]
    BinaryNotFound(String),

    #[error("failed to start {binary}: {source}")]
    Spawn { binary: String, source: io::Error },

    #[error("{0}")]
    Process(String),

    #[error("no process with pid {0}")]
    ProcessNotFound(u32),

    #[error("access denied to process {0}")]
    PermissionDenied(u32),

    #[error("the configuration file is not in JSON format")]
    ConfigNotJson(#[source] serde_json::Error),

    #[error("{tool} failed ({fault}): {detail}")]
    Tool {
        tool: String,
        fault: ToolFault,
        detail: String,
    },
}

impl HuskError {
    pub fn kind(&self) -> &'static str {
        match self {
            HuskError::Validation(_) => "validation",
            HuskError::Path(_) => "path",
            HuskError::NoDiskFound(_) => "no_disk_found",
            HuskError::DiskMissingNoMedium(_) => "disk_missing_no_medium",
            HuskError::DiskLikelyEmpty(_, _) => "disk_likely_empty",
            HuskError::MediumNotFound(_) => "medium_not_found",
            HuskError::BinaryNotFound(_) => "binary_not_found",
            HuskError::Spawn { .. } => "spawn_failed",
            HuskError::Process(_) => "process",
            HuskError::ProcessNotFound(_) => "process_not_found",
            HuskError::PermissionDenied(_) => "permission_denied",
            HuskError::ConfigNotJson(_) => "config_not_json",
            HuskError::Tool { .. } => "tool_failed",
        }
    }
}
