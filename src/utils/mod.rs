//! Shared file and hashing helpers.

pub mod encoding;
pub mod hashing;

pub use encoding::{is_binary_file, read_file_safe};
pub use hashing::content_hash;
