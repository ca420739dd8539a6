//! Optional content fingerprints captured alongside the file facts.

use std::fs;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashMode {
    #[default]
    None,
    Fast, // first 64 KiB only
    Full, // whole file
}

impl From<&str> for HashMode {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fast" => HashMode::Fast,
            "full" => HashMode::Full,
            _ => HashMode::None,
        }
    }
}

impl HashMode {
    /// Hex blake3 digest per the mode; `Ok(None)` when hashing is off.
    pub fn digest(&self, path: &Path) -> std::io::Result<Option<String>> {
        match self {
            HashMode::None => Ok(None),
            HashMode::Fast => fast_hash(path).map(Some),
            HashMode::Full => full_hash(path).map(Some),
        }
    }
}

fn fast_hash(path: &Path) -> std::io::Result<String> {
    const BYTES: usize = 64 * 1024;
    let file = fs::File::open(path)?;
    let mut buf = Vec::with_capacity(BYTES);
    file.take(BYTES as u64).read_to_end(&mut buf)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(&buf);
    Ok(hasher.finalize().to_hex().to_string())
}

fn full_hash(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
