use crate::HuskError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LaunchResult {
    pub pid: u32,
    pub command_line: Vec<String>,
}

/// Spawns the hypervisor in its own process group with no inherited stdio,
/// so it survives this one-shot controller exiting. Returns as soon as the
/// pid is known; the child is never waited on or read from.
pub fn launch(binary: &str, args: &[String]) -> Result<LaunchResult, HuskError> {
    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0);

    let child = command.spawn().map_err(|err| match err.kind() {
        ErrorKind::NotFound => HuskError::BinaryNotFound(binary.to_string()),
        _ => HuskError::Spawn {
            binary: binary.to_string(),
            source: err,
        },
    })?;

    let mut command_line = Vec::with_capacity(args.len() + 1);
    command_line.push(binary.to_string());
    command_line.extend(args.iter().cloned());

    log::info!("started {} as pid {}", binary, child.id());

    Ok(LaunchResult {
        pid: child.id(),
        command_line,
    })
}

/// Probes candidate hypervisor binaries with `--version` and returns the
/// first that answers. When none does, the first candidate is handed back
/// anyway and the actual spawn reports the real failure.
pub fn detect_qemu_binary(candidates: &[String]) -> String {
    for candidate in candidates {
        let probe = Command::new(candidate)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if matches!(probe, Ok(status) if status.success()) {
            log::debug!("hypervisor binary probe hit {}", candidate);
            return candidate.clone();
        }
    }

    candidates
        .first()
        .cloned()
        .unwrap_or_else(|| "qemu-system-x86_64".to_string())
}
