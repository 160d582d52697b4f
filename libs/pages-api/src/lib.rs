//! Request and response models shared by the Pages deployment client.

pub mod models;

pub use models::*;
