//! GitHub Pages deployment library
//!
//! Resolves an uploaded build artifact, creates a Pages deployment from it and
//! supervises the deployment until it settles or its deadline passes.

pub mod app;
pub mod authn;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod report;
pub mod utils;
