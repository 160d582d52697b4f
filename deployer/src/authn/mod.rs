//! Credential inspection

pub mod identity_token;
