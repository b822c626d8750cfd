//! Compressed siblings.
//!
//! Output is deterministic (gzip header mtime fixed at zero), so
//! recompressing unchanged content yields identical bytes.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};

use crate::core::{IoResultExt, StageResult};
use crate::freshness::is_newer_than;
use crate::utils::path::with_suffix;

/// Gzip `bytes` in memory.
pub fn gzip_bytes(bytes: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::with_capacity(bytes.len() / 2), Compression::new(level));
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Inflate a gzip stream held in memory.
pub fn decompress_bytes(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::with_capacity(bytes.len() * 3);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Sibling path of `path` for `suffix`.
#[inline]
pub fn compressed_path(path: &Path, suffix: &str) -> PathBuf {
    with_suffix(path, suffix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressOutcome {
    /// Sibling already newer than the source, or already holding the same
    /// compressed bytes.
    Fresh,
    /// Sibling (re)written with this many bytes.
    Written(u64),
}

/// Produce `dst` as the compressed form of `src`. The source is never
/// modified.
pub fn compress_file(src: &Path, dst: &Path, level: u32) -> StageResult<CompressOutcome> {
    if dst.is_file() && is_newer_than(dst, src) {
        return Ok(CompressOutcome::Fresh);
    }

    let bytes = fs::read(src).op("read", src)?;
    let compressed = gzip_bytes(&bytes, level).op("compress", src)?;

    if fs::read(dst).is_ok_and(|existing| existing == compressed) {
        return Ok(CompressOutcome::Fresh);
    }
    fs::write(dst, &compressed).op("write", dst)?;
    Ok(CompressOutcome::Written(compressed.len() as u64))
}

/// Recreate a plain file from its compressed sibling.
pub fn decompress_file(src: &Path, dst: &Path) -> StageResult<u64> {
    let bytes = fs::read(src).op("read", src)?;
    let plain = decompress_bytes(&bytes).op("decompress", src)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).op("create directory", parent)?;
    }
    fs::write(dst, &plain).op("write", dst)?;
    Ok(plain.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_gzip_is_deterministic_and_reversible() {
        let content = b"<html><body>hello</body></html>\n".repeat(20);
        let a = gzip_bytes(&content, 9).unwrap();
        let b = gzip_bytes(&content, 9).unwrap();
        assert_eq!(a, b);
        assert!(a.len() < content.len());
        assert_eq!(decompress_bytes(&a).unwrap(), content);
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        assert!(decompress_bytes(b"not gzip at all").is_err());
    }

    #[test]
    fn test_compress_file_creates_sibling() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("index.html");
        fs::write(&src, "<html></html>").unwrap();
        let dst = compressed_path(&src, ".gz");
        assert_eq!(dst, dir.path().join("index.html.gz"));

        let outcome = compress_file(&src, &dst, 9).unwrap();
        assert!(matches!(outcome, CompressOutcome::Written(n) if n > 0));
        assert_eq!(fs::read_to_string(&src).unwrap(), "<html></html>");
        assert_eq!(
            decompress_bytes(&fs::read(&dst).unwrap()).unwrap(),
            b"<html></html>"
        );
        assert_eq!(compress_file(&src, &dst, 9).unwrap(), CompressOutcome::Fresh);
    }

    #[test]
    fn test_stale_sibling_is_rewritten() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.css");
        let dst = dir.path().join("a.css.gz");
        fs::write(&dst, gzip_bytes(b"old", 9).unwrap()).unwrap();
        fs::write(&src, "new").unwrap();
        let past = SystemTime::now() - Duration::from_secs(60);
        set_mtime(&dst, past);

        assert!(matches!(
            compress_file(&src, &dst, 9).unwrap(),
            CompressOutcome::Written(_)
        ));
        assert_eq!(decompress_bytes(&fs::read(&dst).unwrap()).unwrap(), b"new");
    }

    #[test]
    fn test_newer_sibling_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.css");
        let dst = dir.path().join("a.css.gz");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, b"whatever").unwrap();
        set_mtime(&src, SystemTime::now() - Duration::from_secs(60));

        assert_eq!(compress_file(&src, &dst, 9).unwrap(), CompressOutcome::Fresh);
        assert_eq!(fs::read(&dst).unwrap(), b"whatever");
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("missing.js");
        assert!(compress_file(&src, &dir.path().join("missing.js.gz"), 9).is_err());
    }

    #[test]
    fn test_decompress_file() {
        let dir = TempDir::new().unwrap();
        let gz = dir.path().join("pages/a.html.gz");
        fs::create_dir_all(gz.parent().unwrap()).unwrap();
        fs::write(&gz, gzip_bytes(b"<p>a</p>", 6).unwrap()).unwrap();
        let plain = dir.path().join("pages/a.html");
        assert_eq!(decompress_file(&gz, &plain).unwrap(), 8);
        assert_eq!(fs::read(&plain).unwrap(), b"<p>a</p>");
    }
}
