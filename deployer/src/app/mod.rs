//! Application wiring: options, settings and the run entry point

pub mod options;
pub mod run;
pub mod settings;
