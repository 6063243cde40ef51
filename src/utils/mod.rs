//! Small shared utilities: path decomposition and dictionary discovery.

pub mod file_path;
