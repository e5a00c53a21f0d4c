use clap::Parser;
use husk_core::{init_logging, GlobalConfig, Payload, RawVmSpec, VmManager, HUSK_CONFIG};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::exit;

/// One-shot VM manager: one action in, exactly one JSON payload out.
#[derive(Parser, Debug)]
#[command(name = "husk", version, about = "stateless QEMU VM lifecycle manager")]
struct Cli {
    /// Service to drive; only the VM service lives in this binary.
    #[arg(long, default_value = "qemu")]
    service: String,

    /// Action to perform.
    #[arg(long)]
    action: String,

    /// JSON object with the action's arguments.
    #[arg(long)]
    args: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFileArgs {
    #[serde(default)]
    config_file_path: String,
}

#[derive(Debug, Default, Deserialize)]
struct StopArgs {
    #[serde(default)]
    pid: Option<PidArg>,
}

/// The front end sometimes hands the pid over as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PidArg {
    Number(u32),
    Text(String),
}

impl PidArg {
    fn as_u32(&self) -> Option<u32> {
        match self {
            PidArg::Number(pid) => Some(*pid),
            PidArg::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateDiskArgs {
    #[serde(default)]
    path: String,
    #[serde(default)]
    size: String,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteVmArgs {
    #[serde(default)]
    disk_path: String,
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let payload = run(&cli);

    match serde_json::to_string(&payload) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            log::error!("failed to serialize result payload: {}", err);
            exit(2);
        }
    }

    exit(if payload.success { 0 } else { 1 });
}

fn fail(message: impl Into<String>) -> Payload {
    Payload {
        success: false,
        error: Some(message.into()),
        ..Default::default()
    }
}

fn run(cli: &Cli) -> Payload {
    if cli.service != "qemu" {
        return fail(format!("Unknown service: {}", cli.service));
    }

    let config = match GlobalConfig::load_or_default(HUSK_CONFIG) {
        Ok(config) => config,
        Err(err) => return fail(format!("{:#}", err)),
    };
    let manager = VmManager::new(config);

    let args = cli.args.as_deref().unwrap_or("{}");

    match cli.action.as_str() {
        "start_virtual_machine" => match parse_args::<RawVmSpec>(args) {
            Ok(spec) => manager.start_vm(spec),
            Err(payload) => payload,
        },
        "create_vm_from_config" => match parse_args::<ConfigFileArgs>(args) {
            Ok(file) => manager.start_from_config(&PathBuf::from(file.config_file_path)),
            Err(payload) => payload,
        },
        "list_running_vms" => manager.list_vms(),
        "stop_vm" => match parse_args::<StopArgs>(args) {
            Ok(stop) => match stop.pid.as_ref().and_then(PidArg::as_u32) {
                Some(pid) => manager.stop_vm(pid),
                None => fail("no pid given"),
            },
            Err(payload) => payload,
        },
        "create_disk_image" => match parse_args::<CreateDiskArgs>(args) {
            Ok(disk) => manager.create_disk_image(&PathBuf::from(disk.path), &disk.size),
            Err(payload) => payload,
        },
        "delete_vm" => match parse_args::<DeleteVmArgs>(args) {
            Ok(delete) => manager.delete_vm(&PathBuf::from(delete.disk_path)),
            Err(payload) => payload,
        },
        other => fail(format!("Unknown action: {}", other)),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: &str) -> Result<T, Payload> {
    serde_json::from_str(args).map_err(|err| fail(format!("arguments are not valid JSON: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_arg_accepts_number_or_string() {
        let num: StopArgs = serde_json::from_str(r#"{"pid": 42}"#).unwrap();
        assert_eq!(num.pid.unwrap().as_u32(), Some(42));

        let text: StopArgs = serde_json::from_str(r#"{"pid": " 42 "}"#).unwrap();
        assert_eq!(text.pid.unwrap().as_u32(), Some(42));

        let bogus: StopArgs = serde_json::from_str(r#"{"pid": "not-a-pid"}"#).unwrap();
        assert_eq!(bogus.pid.unwrap().as_u32(), None);
    }

    #[test]
    fn unknown_action_fails_with_a_payload() {
        let cli = Cli {
            service: "qemu".to_string(),
            action: "reticulate_splines".to_string(),
            args: None,
        };
        let payload = run(&cli);
        assert!(!payload.success);
        assert!(payload.error.unwrap().contains("Unknown action"));
    }

    #[test]
    fn unknown_service_fails_with_a_payload() {
        let cli = Cli {
            service: "docker".to_string(),
            action: "list_running_vms".to_string(),
            args: None,
        };
        let payload = run(&cli);
        assert!(!payload.success);
        assert!(payload.error.unwrap().contains("Unknown service"));
    }

    #[test]
    fn bad_argument_json_fails_before_the_manager_runs() {
        let cli = Cli {
            service: "qemu".to_string(),
            action: "start_virtual_machine".to_string(),
            args: Some("not json".to_string()),
        };
        let payload = run(&cli);
        assert!(!payload.success);
        assert!(payload.error.unwrap().contains("not valid JSON"));
    }
}
