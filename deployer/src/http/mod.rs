//! HTTP access to the Actions runtime and the Pages API

pub mod artifacts;
pub mod client;
pub mod pages;
