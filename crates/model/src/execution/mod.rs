pub mod failed_row;
pub mod report;
pub mod run_result;
