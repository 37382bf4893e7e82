#[macro_use]
pub mod macros;

pub mod fs_json_util;
