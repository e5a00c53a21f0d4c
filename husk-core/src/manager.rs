use crate::disk::{create_disk_image, delete_disk_image, resolve_disk};
use crate::launch::{detect_qemu_binary, launch, LaunchResult};
use crate::process_list::list_vm_processes;
use crate::stop::{stop_process, StopOutcome};
use crate::{BatchConfig, GlobalConfig, HuskError, Payload, QemuCommandBuilder, RawVmSpec, VmSpec};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// The entry-point boundary. One method per action, each recovering every
/// error into a structured failure payload; nothing propagates out as a
/// fault. Holds no state beyond the global config, so a fresh controller
/// process can pick up any VM launched by an earlier one.
pub struct VmManager {
    config: GlobalConfig,
}

impl VmManager {
    pub fn new(config: GlobalConfig) -> VmManager {
        VmManager { config }
    }

    pub fn start_vm(&self, raw: RawVmSpec) -> Payload {
        match self.try_start(raw) {
            Ok(launched) => Payload {
                success: true,
                message: Some("VM started".to_string()),
                pid: Some(launched.pid),
                command_line: Some(launched.command_line.join(" ")),
                ..Default::default()
            },
            Err(err) => {
                log::warn!("failed to start VM: {}", err);
                Payload::failure(&err)
            }
        }
    }

    fn try_start(&self, raw: RawVmSpec) -> Result<LaunchResult, HuskError> {
        let spec = VmSpec::from_raw(raw)?;
        let disk = resolve_disk(
            &spec.disk_path,
            spec.iso_path(),
            self.config.heuristics.empty_disk_threshold,
        )?;
        let args = QemuCommandBuilder::new(&spec, &disk).build();
        let binary = detect_qemu_binary(&self.config.qemu.binaries);
        launch(&binary, &args)
    }

    /// Launches every entry of a batch file, sequentially and independently;
    /// one entry failing neither aborts the rest nor rolls back earlier
    /// launches. The envelope succeeds once the file itself was readable.
    pub fn start_from_config(&self, path: &Path) -> Payload {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                return Payload::failure(&HuskError::Path(format!(
                    "configuration file not found: {}: {}",
                    path.display(),
                    err
                )))
            }
        };

        let batch = match BatchConfig::parse(&text) {
            Ok(batch) => batch,
            Err(err) => return Payload::failure(&err),
        };

        let results: Vec<Payload> = batch
            .entries()
            .into_iter()
            .map(|raw| self.start_vm(raw))
            .collect();

        Payload::with_data(serde_json::to_value(results).unwrap_or_default())
    }

    pub fn list_vms(&self) -> Payload {
        let records = list_vm_processes();
        log::debug!("found {} running VM process(es)", records.len());
        Payload::with_data(serde_json::to_value(records).unwrap_or_default())
    }

    pub fn stop_vm(&self, pid: u32) -> Payload {
        let grace = Duration::from_secs(self.config.heuristics.stop_grace_period_secs);
        match stop_process(pid, grace) {
            Ok(StopOutcome::Exited) => Payload::success(format!("VM with pid {} stopped", pid)),
            Ok(StopOutcome::ForceKilled) => Payload::success(format!(
                "VM with pid {} did not stop within {}s and was killed",
                pid,
                grace.as_secs()
            )),
            Err(err) => {
                log::warn!("failed to stop pid {}: {}", pid, err);
                Payload::failure(&err)
            }
        }
    }

    pub fn create_disk_image(&self, path: &Path, size: &str) -> Payload {
        if path.as_os_str().is_empty() {
            return Payload::failure(&HuskError::Validation("no disk path given".to_string()));
        }
        if size.is_empty() {
            return Payload::failure(&HuskError::Validation("no disk size given".to_string()));
        }

        match create_disk_image(&self.config.qemu.img_binary, path, size) {
            Ok(created) => Payload::success(format!("disk image created at {}", created.display())),
            Err(err) => Payload::failure(&err),
        }
    }

    pub fn delete_vm(&self, disk_path: &Path) -> Payload {
        match delete_disk_image(disk_path) {
            Ok(()) => Payload::success("VM deleted"),
            Err(err) => Payload::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager() -> VmManager {
        VmManager::new(GlobalConfig::default())
    }

    fn batch_results(payload: &Payload) -> Vec<Payload> {
        serde_json::from_value(payload.data.clone().unwrap()).unwrap()
    }

    #[test]
    fn batch_keeps_going_past_a_bad_entry() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("vms.json");
        // entries 1 and 3 fail at disk resolution, entry 2 never validates;
        // none of them reach the hypervisor spawn
        fs::write(
            &config,
            format!(
                r#"[
                    {{"cpu_cores": 2, "ram_size": 1024, "disk_path": "{0}/missing-a.qcow2"}},
                    {{"cpu_cores": 2, "ram_size": 1024}},
                    {{"cpu_cores": 2, "ram_size": 1024, "disk_path": "{0}/missing-b.qcow2"}}
                ]"#,
                dir.path().display()
            ),
        )
        .unwrap();

        let payload = manager().start_from_config(&config);
        assert!(payload.success);

        let results = batch_results(&payload);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].details.as_deref(), Some("disk_missing_no_medium"));
        assert_eq!(results[1].details.as_deref(), Some("validation"));
        assert_eq!(results[2].details.as_deref(), Some("disk_missing_no_medium"));
    }

    #[test]
    fn batch_accepts_a_single_object() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("vm.json");
        fs::write(
            &config,
            format!(
                r#"{{"cpu_cores": 1, "ram_size": 512, "disk_path": "{}/missing.qcow2"}}"#,
                dir.path().display()
            ),
        )
        .unwrap();

        let payload = manager().start_from_config(&config);
        assert!(payload.success);
        assert_eq!(batch_results(&payload).len(), 1);
    }

    #[test]
    fn missing_batch_file_is_a_path_failure() {
        let dir = tempdir().unwrap();
        let payload = manager().start_from_config(&dir.path().join("gone.json"));
        assert!(!payload.success);
        assert_eq!(payload.details.as_deref(), Some("path"));
    }

    #[test]
    fn malformed_batch_file_is_config_not_json() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("vms.json");
        fs::write(&config, "cpu_cores: 2\nram_size: 1024\n").unwrap();

        let payload = manager().start_from_config(&config);
        assert!(!payload.success);
        assert_eq!(payload.details.as_deref(), Some("config_not_json"));
    }

    #[test]
    fn start_vm_recovers_validation_errors_into_a_payload() {
        let payload = manager().start_vm(RawVmSpec::default());
        assert!(!payload.success);
        assert_eq!(payload.details.as_deref(), Some("validation"));
        assert!(payload.pid.is_none());
    }

    #[test]
    fn create_disk_image_rejects_empty_arguments() {
        let dir = tempdir().unwrap();
        let payload = manager().create_disk_image(&dir.path().join("vm.qcow2"), "");
        assert!(!payload.success);
        assert_eq!(payload.details.as_deref(), Some("validation"));

        let payload = manager().create_disk_image(Path::new(""), "10G");
        assert_eq!(payload.details.as_deref(), Some("validation"));
    }

    #[test]
    fn delete_vm_reports_success_and_removes_the_disk() {
        let dir = tempdir().unwrap();
        let disk = dir.path().join("old.qcow2");
        fs::write(&disk, b"x").unwrap();

        let payload = manager().delete_vm(&disk);
        assert!(payload.success);
        assert!(!disk.exists());

        let payload = manager().delete_vm(&disk);
        assert!(!payload.success);
        assert_eq!(payload.details.as_deref(), Some("path"));
    }
}
