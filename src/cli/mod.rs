//! CLI module containing argument parsing and related functionality

pub mod args;
pub mod converter;

pub use args::{Args, Command};
