use vaultsync_core::{compare, ClockRelation};

use crate::commands::common::parse_clock;
use crate::error::CliError;

pub fn run_compare(clock_a: &str, clock_b: &str) -> Result<(), CliError> {
    println!("{}", compare_clocks(clock_a, clock_b)?);
    Ok(())
}

pub fn compare_clocks(clock_a: &str, clock_b: &str) -> Result<ClockRelation, CliError> {
    let a = parse_clock(clock_a)?;
    let b = parse_clock(clock_b)?;
    Ok(compare(&a, &b))
}
