use serde::{Deserialize, Serialize};
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

/// Executable name patterns that mark a genuine hypervisor process.
pub const HYPERVISOR_PATTERNS: &[&str] = &["qemu-system-", "qemu-kvm", "qemu.exe"];

/// Interpreter/runtime names that disqualify a match; a controller process
/// can embed a qemu substring through an unrelated dependency path.
pub const RUNTIME_EXCLUSIONS: &[&str] = &["python", "node", "electron"];

/// Snapshot of one discovered VM process. Recomputed from the live process
/// table on every listing; nothing here is cached.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VmProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cmdline: Vec<String>,
    /// Seconds since the epoch.
    pub start_time: u64,
}

/// Pure classifier over a process's name and executable path.
pub fn is_vm_process(name: &str, exe: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let exe = exe.to_ascii_lowercase();

    let looks_like_hypervisor = HYPERVISOR_PATTERNS
        .iter()
        .any(|pattern| name.contains(pattern) || exe.contains(pattern));

    let looks_like_runtime = RUNTIME_EXCLUSIONS
        .iter()
        .any(|pattern| name.contains(pattern) || exe.contains(pattern));

    looks_like_hypervisor && !looks_like_runtime
}

/// Walks the OS process table and keeps the hypervisor instances. Processes
/// that vanish mid-enumeration simply drop out of the snapshot; a partial
/// listing beats no listing.
pub fn list_vm_processes() -> Vec<VmProcessRecord> {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
    );

    let mut records: Vec<VmProcessRecord> = system
        .processes()
        .iter()
        .filter_map(|(pid, process)| {
            let exe = process
                .exe()
                .map(|x| x.to_string_lossy().into_owned())
                .unwrap_or_default();

            if !is_vm_process(process.name(), &exe) {
                return None;
            }

            Some(VmProcessRecord {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                cmdline: process.cmd().to_vec(),
                start_time: process.start_time(),
            })
        })
        .collect();

    records.sort_by_key(|record| record.pid);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hypervisor_names_match() {
        assert!(is_vm_process("qemu-system-x86_64", "/usr/bin/qemu-system-x86_64"));
        assert!(is_vm_process("qemu-kvm", ""));
        assert!(is_vm_process("qemu.exe", ""));
    }

    #[test]
    fn exe_path_alone_is_enough() {
        assert!(is_vm_process("kvm", "/usr/libexec/qemu-kvm"));
    }

    #[test]
    fn unrelated_processes_do_not_match() {
        assert!(!is_vm_process("firefox", "/usr/bin/firefox"));
        assert!(!is_vm_process("qemu-img", "/usr/bin/qemu-img"));
    }

    #[test]
    fn runtime_exclusion_beats_a_hypervisor_match() {
        // controller process with a matching substring buried in its path
        assert!(!is_vm_process(
            "python3",
            "/opt/app/python3/site-packages/qemu-system-helper"
        ));
        assert!(!is_vm_process("qemu-system-x86_64", "/usr/bin/python3"));
        assert!(!is_vm_process(
            "electron",
            "/opt/app/node_modules/qemu-kvm-bridge/electron"
        ));
    }

    #[test]
    fn matching_ignores_case() {
        assert!(is_vm_process("QEMU-System-X86_64", ""));
        assert!(!is_vm_process("Python", "/usr/bin/Qemu-Kvm-wrapper"));
    }
}
