//! Encoding detection and file reading with UTF-8 fallback logic.
//!
//! Checkouts contain whatever their authors committed, so reads never fail on
//! bad encodings:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast-path with strict validation
//! - Fallback encoding detection using chardetng
//! - Binary file detection

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Detect if a file is binary (not text).
///
/// A null byte, or fewer than 70% printable bytes in the sample, means binary.
/// Unreadable files count as binary so callers skip them.
pub fn is_binary_file(path: &Path, sample_size: usize) -> bool {
    is_binary_file_impl(path, sample_size).unwrap_or(true)
}

fn is_binary_file_impl(path: &Path, sample_size: usize) -> Result<bool> {
    let sample = read_sample(path, sample_size)?;

    if sample.is_empty() {
        return Ok(false);
    }
    if sample.contains(&0) {
        return Ok(true);
    }

    let printable_count = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == 9 || b == 10 || b == 13 || b >= 0x80)
        .count();

    Ok((printable_count as f64 / sample.len() as f64) < 0.70)
}

/// Read a whole file as text.
///
/// Strict UTF-8 first, then BOM / chardetng detection, decoding with
/// replacement characters as a last resort.
pub fn read_file_safe(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    if let Some(rest) = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        return Ok(String::from_utf8_lossy(rest).into_owned());
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        return Ok(UTF_16LE.decode(&bytes).0.into_owned());
    }
    if bytes.starts_with(&[0xfe, 0xff]) {
        return Ok(UTF_16BE.decode(&bytes).0.into_owned());
    }

    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(err) => {
            let bytes = err.into_bytes();
            let encoding = detect_encoding(&bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)]);
            let (decoded, _, _) = encoding.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn detect_encoding(sample: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let guess = detector.guess(None, true);
    if guess.name().eq_ignore_ascii_case("ascii") {
        UTF_8
    } else {
        guess
    }
}

fn read_sample(path: &Path, sample_size: usize) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut sample = vec![0u8; sample_size];
    let bytes_read = file.read(&mut sample)?;
    sample.truncate(bytes_read);
    Ok(sample)
}
