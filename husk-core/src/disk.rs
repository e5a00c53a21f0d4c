use crate::{classify_tool_stderr, HuskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Extensions recognized as disk images when scanning a directory.
pub const DISK_EXTENSIONS: &[&str] = &["qcow2", "raw", "img", "vmdk", "vhdx", "vdi"];

/// Target synthesized when resolving a directory that holds no image yet.
pub const DEFAULT_DISK_NAME: &str = "vm_disk.qcow2";

#[derive(Eq, PartialEq, Copy, Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskFormat {
    Raw,
    Qcow2,
    Vmdk,
    Vhdx,
    Vdi,
}

impl DiskFormat {
    /// Derived solely from the extension; .img, .raw and anything
    /// unrecognized are treated as raw.
    pub fn from_path(path: &Path) -> DiskFormat {
        let ext = path
            .extension()
            .and_then(|x| x.to_str())
            .map(|x| x.to_ascii_lowercase());

        match ext.as_deref() {
            Some("qcow2") => DiskFormat::Qcow2,
            Some("vmdk") => DiskFormat::Vmdk,
            Some("vhdx") => DiskFormat::Vhdx,
            Some("vdi") => DiskFormat::Vdi,
            _ => DiskFormat::Raw,
        }
    }
}

impl Display for DiskFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DiskFormat::Raw => write!(f, "raw"),
            DiskFormat::Qcow2 => write!(f, "qcow2"),
            DiskFormat::Vmdk => write!(f, "vmdk"),
            DiskFormat::Vhdx => write!(f, "vhdx"),
            DiskFormat::Vdi => write!(f, "vdi"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedDisk {
    pub path: PathBuf,
    pub format: DiskFormat,
    /// When false the spec carried an install medium and the image is yet to
    /// be created; resolution never hands out a missing disk otherwise.
    pub exists: bool,
}

fn has_disk_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|x| x.to_str())
        .map(|x| x.to_ascii_lowercase())
        .map_or(false, |ext| DISK_EXTENSIONS.contains(&ext.as_str()))
}

/// First recognized image in directory-listing order, if any.
fn find_disk_in_dir(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && has_disk_extension(&path) {
            return Some(path);
        }
    }
    None
}

/// Turns a user-supplied disk path into a concrete image file plus format.
///
/// A directory is scanned for an existing image; without one, an install
/// medium lets us fall back to a default target that disk creation will fill
/// in later. The empty-disk size check is a labeled heuristic: it only fires
/// for non-qcow2 images whose size is readable, never blocks when uncertain.
pub fn resolve_disk(
    disk_path: &Path,
    iso_path: Option<&Path>,
    empty_disk_threshold: u64,
) -> Result<ResolvedDisk, HuskError> {
    let mut path = disk_path.to_path_buf();

    if path.is_dir() {
        match find_disk_in_dir(&path) {
            Some(found) => {
                log::debug!("using disk image {} found in {}", found.display(), path.display());
                path = found;
            }
            None if iso_path.is_none() => return Err(HuskError::NoDiskFound(path)),
            None => path = path.join(DEFAULT_DISK_NAME),
        }
    }

    let format = DiskFormat::from_path(&path);
    let exists = path.is_file();

    if !exists {
        if iso_path.is_none() {
            return Err(HuskError::DiskMissingNoMedium(path));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(HuskError::Path(format!(
                    "parent directory does not exist: {}",
                    parent.display()
                )));
            }
        }
    }

    if exists && format != DiskFormat::Qcow2 && iso_path.is_none() {
        if let Ok(meta) = fs::metadata(&path) {
            if meta.len() < empty_disk_threshold {
                return Err(HuskError::DiskLikelyEmpty(path, meta.len()));
            }
        }
    }

    if let Some(iso) = iso_path {
        if !iso.is_file() {
            return Err(HuskError::MediumNotFound(iso.to_path_buf()));
        }
    }

    Ok(ResolvedDisk {
        path,
        format,
        exists,
    })
}

/// Creates a fresh qcow2 image via the external image utility. Refuses to
/// touch an existing file; creates missing parent directories.
pub fn create_disk_image(
    img_binary: &str,
    path: &Path,
    size: &str,
) -> Result<PathBuf, HuskError> {
    let mut path = path.to_path_buf();

    if path.is_dir() {
        path = path.join(DEFAULT_DISK_NAME);
    } else if path.exists() && !path.is_file() {
        return Err(HuskError::Path(format!(
            "path exists but is not a file: {}",
            path.display()
        )));
    }

    if path.exists() {
        return Err(HuskError::Path(format!(
            "disk image already exists at {}; pick a different path or delete the existing file",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                HuskError::Path(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    err
                ))
            })?;
        }
    }

    let output = Command::new(img_binary)
        .args(&["create", "-f", "qcow2"])
        .arg(&path)
        .arg(size)
        .output()
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => HuskError::BinaryNotFound(img_binary.to_string()),
            _ => HuskError::Spawn {
                binary: img_binary.to_string(),
                source: err,
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HuskError::Tool {
            tool: img_binary.to_string(),
            fault: classify_tool_stderr(&stderr),
            detail: stderr.trim().to_string(),
        });
    }

    log::info!("created disk image at {}", path.display());
    Ok(path)
}

/// Removes a VM's disk image.
pub fn delete_disk_image(path: &Path) -> Result<(), HuskError> {
    if !path.exists() {
        return Err(HuskError::Path(format!(
            "VM disk not found: {}",
            path.display()
        )));
    }

    fs::remove_file(path).map_err(|err| {
        HuskError::Path(format!("failed to delete {}: {}", path.display(), err))
    })
}
