use crate::{ResolvedDisk, VmSpec};
use std::path::Path;

/// Builds the hypervisor argument vector from a validated spec and resolved
/// disk. Pure; the binary itself is not part of the produced arguments.
pub struct QemuCommandBuilder<'a> {
    spec: &'a VmSpec,
    disk: &'a ResolvedDisk,
}

impl<'a> QemuCommandBuilder<'a> {
    pub fn new(spec: &'a VmSpec, disk: &'a ResolvedDisk) -> QemuCommandBuilder<'a> {
        QemuCommandBuilder { spec, disk }
    }

    pub fn build(&self) -> Vec<String> {
        let mut cmd = vec![
            "-smp".to_string(),
            self.spec.cpu_cores.to_string(),
            "-m".to_string(),
            self.spec.ram_size_mb.to_string(),
            "-drive".to_string(),
            format!(
                "file={},format={},if=ide,index=0,media=disk",
                qemu_path(&self.disk.path),
                self.disk.format
            ),
        ];

        if let Some(iso) = self.spec.iso_path() {
            cmd.push("-cdrom".to_string());
            cmd.push(qemu_path(iso));
            // install medium first, then the disk
            cmd.push("-boot".to_string());
            cmd.push("order=dc".to_string());
        } else {
            cmd.push("-boot".to_string());
            cmd.push("order=c".to_string());
        }

        cmd.extend(
            ["-netdev", "user,id=net0", "-device", "virtio-net,netdev=net0"]
                .iter()
                .map(|x| x.to_string()),
        );

        cmd
    }
}

/// QEMU wants forward slashes regardless of where the path came from.
fn qemu_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiskFormat;
    use std::path::PathBuf;

    fn spec(iso: Option<&str>) -> VmSpec {
        VmSpec {
            cpu_cores: 2,
            ram_size_mb: 2048,
            disk_path: PathBuf::from("/vms/machine.qcow2"),
            iso_path: iso.map(PathBuf::from),
        }
    }

    fn disk(format: DiskFormat, exists: bool) -> ResolvedDisk {
        ResolvedDisk {
            path: PathBuf::from("/vms/machine.qcow2"),
            format,
            exists,
        }
    }

    #[test]
    fn disk_only_boots_from_disk_without_cdrom() {
        let spec = spec(None);
        let disk = disk(DiskFormat::Qcow2, true);
        let cmd = QemuCommandBuilder::new(&spec, &disk).build();

        assert!(cmd.windows(2).any(|w| w == ["-smp", "2"]));
        assert!(cmd.windows(2).any(|w| w == ["-m", "2048"]));
        assert!(cmd
            .iter()
            .any(|x| x == "file=/vms/machine.qcow2,format=qcow2,if=ide,index=0,media=disk"));
        assert!(cmd.windows(2).any(|w| w == ["-boot", "order=c"]));
        assert!(!cmd.iter().any(|x| x == "-cdrom"));
    }

    #[test]
    fn medium_adds_cdrom_and_boots_from_it_first() {
        let spec = spec(Some("/isos/install.iso"));
        let disk = disk(DiskFormat::Qcow2, true);
        let cmd = QemuCommandBuilder::new(&spec, &disk).build();

        assert!(cmd
            .windows(2)
            .any(|w| w == ["-cdrom", "/isos/install.iso"]));
        assert!(cmd.windows(2).any(|w| w == ["-boot", "order=dc"]));
    }

    #[test]
    fn user_network_is_always_attached() {
        for iso in &[None, Some("/isos/install.iso")] {
            let spec = spec(*iso);
            let disk = disk(DiskFormat::Raw, true);
            let cmd = QemuCommandBuilder::new(&spec, &disk).build();
            assert!(cmd.windows(2).any(|w| w == ["-netdev", "user,id=net0"]));
            assert!(cmd
                .windows(2)
                .any(|w| w == ["-device", "virtio-net,netdev=net0"]));
        }
    }

    #[test]
    fn drive_carries_the_resolved_format() {
        let spec = spec(None);
        let disk = ResolvedDisk {
            path: PathBuf::from("/vms/machine.vmdk"),
            format: DiskFormat::Vmdk,
            exists: true,
        };
        let cmd = QemuCommandBuilder::new(&spec, &disk).build();
        assert!(cmd
            .iter()
            .any(|x| x == "file=/vms/machine.vmdk,format=vmdk,if=ide,index=0,media=disk"));
    }

    #[test]
    fn backslashes_are_normalized_for_qemu() {
        assert_eq!(
            qemu_path(Path::new(r"C:\vms\machine.qcow2")),
            "C:/vms/machine.qcow2"
        );
    }
}
