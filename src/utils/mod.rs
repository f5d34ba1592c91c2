//! Utility functions and helpers.

pub mod file_system;

/// Converts a list of borrowed strings into owned ones.
pub fn to_owned(args: Vec<impl AsRef<str>>) -> Vec<String> {
    args.into_iter().map(|arg| arg.as_ref().to_string()).collect()
}
