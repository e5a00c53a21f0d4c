use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub qemu: GlobalQemuConfig,
    pub heuristics: HeuristicsConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all(deserialize = "kebab-case"))]
pub struct GlobalQemuConfig {
    /// Hypervisor binary candidates, probed in order.
    pub binaries: Vec<String>,
    pub img_binary: String,
}

impl Default for GlobalQemuConfig {
    fn default() -> Self {
        GlobalQemuConfig {
            binaries: vec!["qemu-system-x86_64".to_string()],
            img_binary: "qemu-img".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all(deserialize = "kebab-case"))]
pub struct HeuristicsConfig {
    /// Best-effort guess at "this disk was never installed to": non-qcow2
    /// images smaller than this many bytes are refused unless an install
    /// medium comes along. qcow2 is always exempt, its file size says
    /// nothing thanks to sparse allocation.
    pub empty_disk_threshold: u64,
    /// Seconds to wait after SIGTERM before escalating to SIGKILL.
    pub stop_grace_period_secs: u64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        HeuristicsConfig {
            empty_disk_threshold: 100 * 1024,
            stop_grace_period_secs: 5,
        }
    }
}

impl GlobalConfig {
    pub fn load(toml: &str) -> Result<GlobalConfig, anyhow::Error> {
        toml::from_str(toml).context("Failed to parse toml for global config")
    }

    /// Missing config file means defaults; a present but broken one is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<GlobalConfig, anyhow::Error> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(toml) => Self::load(&toml)
                .with_context(|| format!("Failed to load global config at {}", path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(GlobalConfig::default()),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read global config at {}", path.display()))
            }
        }
    }
}
