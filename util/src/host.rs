//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software tree.
pub const SW_ROOT_ENV_VAR: &str = "GUIDANCE_SW_ROOT";

/// Get the root directory of the software tree, which contains the `params`
/// and `sessions` directories.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Get a short description of the host platform, e.g. `linux x86_64`.
pub fn get_platform() -> String {
    format!("{} {}", env::consts::OS, env::consts::ARCH)
}
