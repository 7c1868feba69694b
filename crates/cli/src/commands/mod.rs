//! CLI subcommands

pub mod local;
pub mod remote;
