pub mod common;
pub mod compare;
pub mod completions;
pub mod conflict_name;
pub mod diff;
pub mod quota;
