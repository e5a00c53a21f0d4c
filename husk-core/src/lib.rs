mod consts;
mod diagnostics;
mod disk;
mod error;
mod global_config;
mod launch;
mod manager;
mod payload;
mod process_list;
mod qemu;
mod stop;
mod vm_spec;

pub use consts::*;
pub use diagnostics::*;
pub use disk::*;
pub use error::*;
pub use global_config::*;
pub use launch::*;
pub use manager::*;
pub use payload::*;
pub use process_list::*;
pub use qemu::QemuCommandBuilder;
pub use stop::*;
pub use vm_spec::*;

pub fn init_logging() {
    pretty_env_logger::formatted_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
}
