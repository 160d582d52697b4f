//! Pages deployment lifecycle

pub mod classify;
pub mod client;
pub mod controller;
pub mod fsm;
pub mod resolver;
pub mod supervisor;

pub use client::{MAX_TIMEOUT, ONE_GIGABYTE, SIZE_LIMIT_DESCRIPTION};
pub use controller::Deployment;
pub use supervisor::PollOutcome;
