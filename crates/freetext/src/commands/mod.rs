//! CLI command implementations.

pub(crate) mod process;

pub(crate) use process::ProcessArgs;
