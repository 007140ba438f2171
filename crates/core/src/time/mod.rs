pub mod day_window;

pub use day_window::{DateFormatError, DateWindow, INPUT_DATE_FORMAT};
