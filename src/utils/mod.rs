pub mod display;
pub mod progress_utils;
