use vaultsync_core::conflict_name::generate_conflict_name_at;

use crate::commands::common::{normalize_device_name, resolve_time};
use crate::error::CliError;

pub fn run_conflict_name(path: &str, device_name: &str, at: Option<&str>) -> Result<(), CliError> {
    println!("{}", conflict_name(path, device_name, at)?);
    Ok(())
}

pub fn conflict_name(path: &str, device_name: &str, at: Option<&str>) -> Result<String, CliError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(CliError::EmptyPath);
    }
    let device_name = normalize_device_name(device_name)?;
    let resolved_at = resolve_time(at)?;
    Ok(generate_conflict_name_at(path, &device_name, resolved_at))
}
