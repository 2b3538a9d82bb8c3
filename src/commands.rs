pub mod check;

pub use check::{run_config_check, show_options};
