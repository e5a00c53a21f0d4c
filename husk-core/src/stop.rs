use crate::HuskError;
use std::io;
use std::time::{Duration, Instant};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum StopOutcome {
    /// The process exited within the grace period after SIGTERM.
    Exited,
    /// The grace period ran out and a single SIGKILL was issued.
    ForceKilled,
}

/// Graceful-then-forced termination: SIGTERM, wait out the grace period,
/// escalate to SIGKILL exactly once if the process is still around. The
/// escalation is bookkeeping, not a failure.
pub fn stop_process(pid: u32, grace: Duration) -> Result<StopOutcome, HuskError> {
    let raw_pid = pid as libc::pid_t;

    let res = unsafe { libc::kill(raw_pid, libc::SIGTERM) };
    if res != 0 {
        return Err(signal_error(pid));
    }

    log::debug!("sent SIGTERM to {}, waiting up to {:?}", pid, grace);
    if wait_for_exit(raw_pid, grace) {
        return Ok(StopOutcome::Exited);
    }

    log::warn!("pid {} ignored SIGTERM for {:?}, sending SIGKILL", pid, grace);
    let res = unsafe { libc::kill(raw_pid, libc::SIGKILL) };
    if res != 0 {
        let errno = io::Error::last_os_error().raw_os_error().unwrap_or_default();
        // ESRCH here means it exited right at the deadline
        if errno != libc::ESRCH {
            return Err(signal_error(pid));
        }
    }

    Ok(StopOutcome::ForceKilled)
}

fn signal_error(pid: u32) -> HuskError {
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => HuskError::ProcessNotFound(pid),
        Some(libc::EPERM) => HuskError::PermissionDenied(pid),
        _ => HuskError::Process(format!("failed to signal pid {}: {}", pid, err)),
    }
}

/// True once `kill(pid, 0)` reports ESRCH, false if the timeout elapses
/// first. Polling is the only portable option for a process we never owned.
fn wait_for_exit(pid: libc::pid_t, timeout: Duration) -> bool {
    let start = Instant::now();
    loop {
        let res = unsafe { libc::kill(pid, 0) };
        if res == -1 {
            let errno = io::Error::last_os_error().raw_os_error().unwrap_or_default();
            if errno == libc::ESRCH {
                return true;
            }
        }

        if start.elapsed() >= timeout {
            return false;
        }

        std::thread::sleep(EXIT_POLL_INTERVAL);
    }
}
