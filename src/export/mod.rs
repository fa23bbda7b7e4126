//! Export of run results to delimited text logs

pub mod run_log;

pub use run_log::{RunLog, column_names, log_file_name};
