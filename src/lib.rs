pub mod debugger;
pub mod host;
pub mod log;
pub mod ui;
