//! CLI commands

pub mod inspect;
pub mod pull;
pub mod resolve;
pub mod status;
