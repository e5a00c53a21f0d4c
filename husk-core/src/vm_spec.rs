use crate::HuskError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Wire shape of a VM request, as found in batch files and action arguments.
/// Every field is optional here so missing ones surface as validation errors
/// instead of parse errors.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawVmSpec {
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    #[serde(default)]
    pub ram_size: Option<u32>,
    #[serde(default)]
    pub disk_path: Option<String>,
    #[serde(default)]
    pub iso_path: Option<String>,
}

/// A validated launch request. Constructed per request, consumed once by the
/// command builder, never persisted.
#[derive(Clone, Debug)]
pub struct VmSpec {
    pub cpu_cores: u32,
    pub ram_size_mb: u32,
    pub disk_path: PathBuf,
    pub iso_path: Option<PathBuf>,
}

impl VmSpec {
    pub fn from_raw(raw: RawVmSpec) -> Result<VmSpec, HuskError> {
        let cpu_cores = raw
            .cpu_cores
            .filter(|x| *x > 0)
            .ok_or_else(|| HuskError::Validation("no CPU core count given".to_string()))?;

        let ram_size_mb = raw
            .ram_size
            .filter(|x| *x > 0)
            .ok_or_else(|| HuskError::Validation("no RAM size given".to_string()))?;

        let disk_path = raw
            .disk_path
            .filter(|x| !x.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| HuskError::Validation("no disk path given".to_string()))?;

        let iso_path = raw.iso_path.filter(|x| !x.is_empty()).map(PathBuf::from);

        Ok(VmSpec {
            cpu_cores,
            ram_size_mb,
            disk_path,
            iso_path,
        })
    }

    pub fn iso_path(&self) -> Option<&Path> {
        self.iso_path.as_deref()
    }
}

/// A batch file holds either a single spec object or an array of them.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum BatchConfig {
    One(RawVmSpec),
    Many(Vec<RawVmSpec>),
}

impl BatchConfig {
    pub fn parse(json: &str) -> Result<BatchConfig, HuskError> {
        serde_json::from_str(json).map_err(HuskError::ConfigNotJson)
    }

    pub fn entries(self) -> Vec<RawVmSpec> {
        match self {
            BatchConfig::One(spec) => vec![spec],
            BatchConfig::Many(specs) => specs,
        }
    }
}
