// File with all static constants like e.g. paths

macro_rules! default_env {
    ($val:expr, $def:expr) => {
        match option_env!($val) {
            None => $def,
            Some(x) => x,
        }
    };
}

pub const HUSK_CONFIG: &str = default_env!("HUSK_CONFIG", "/etc/husk/husk.toml");
