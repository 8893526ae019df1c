//! Handlers behind each `glyphchain` subcommand.

pub mod bundle;
pub mod echo;
pub mod manifest;
pub mod stamp;
