//! Streaming access to zip-structured bundle archives.
//!
//! A bundle can be read from a path on disk or from an in-memory buffer. Each
//! call opens the archive, walks its central directory one entry at a time,
//! and drops the archive handle before returning, on success and on failure.
//! Nothing is extracted to disk.
//!
//! Zip parsing is blocking, so the public functions run it on Tokio's
//! blocking pool.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::PathBuf;

use bytes::Bytes;
use zip::ZipArchive;

use crate::error::{ManagerError, Result};

/// Where the bundle bytes come from.
#[derive(Debug, Clone)]
pub enum BundleSource {
    /// A bundle file on disk.
    Path(PathBuf),
    /// A bundle already loaded into memory.
    Buffer(Bytes),
}

impl BundleSource {
    /// Short description for log lines (never the buffer contents).
    pub fn describe(&self) -> String {
        match self {
            BundleSource::Path(p) => p.display().to_string(),
            BundleSource::Buffer(b) => format!("<{} byte buffer>", b.len()),
        }
    }
}

impl From<PathBuf> for BundleSource {
    fn from(path: PathBuf) -> Self {
        BundleSource::Path(path)
    }
}

impl From<&std::path::Path> for BundleSource {
    fn from(path: &std::path::Path) -> Self {
        BundleSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for BundleSource {
    fn from(data: Vec<u8>) -> Self {
        BundleSource::Buffer(Bytes::from(data))
    }
}

impl From<Bytes> for BundleSource {
    fn from(data: Bytes) -> Self {
        BundleSource::Buffer(data)
    }
}

/// The component of an entry path after the last `/`.
pub fn basename(entry_path: &str) -> &str {
    entry_path.rsplit('/').next().unwrap_or(entry_path)
}

/// Case-insensitive match of an entry path against a file name.
///
/// Matches when the entry's basename equals `name`, or when the entry path
/// ends with `name` (so `"certs/ca.crt"` matches `"certs/ca.crt"` too).
pub fn entry_matches(entry_path: &str, name: &str) -> bool {
    let entry = entry_path.to_lowercase();
    let wanted = name.to_lowercase();
    basename(&entry) == wanted || entry.ends_with(&format!("/{}", wanted)) || entry == wanted
}

/// List every entry path in the bundle.
pub async fn list_entries(source: &BundleSource) -> Result<BTreeSet<String>> {
    let source = source.clone();
    tokio::task::spawn_blocking(move || with_archive(&source, list_entries_sync)).await?
}

/// Read the first entry whose path matches `name` (see [`entry_matches`]) as
/// UTF-8 text.
///
/// Returns `Ok(None)` when the archive is readable but has no such entry, and
/// an [`ManagerError::Archive`] when the source is not a zip at all.
pub async fn read_entry_text(source: &BundleSource, name: &str) -> Result<Option<String>> {
    let source = source.clone();
    let name = name.to_string();
    tokio::task::spawn_blocking(move || {
        with_archive(&source, |archive| read_entry_text_sync(archive, &name))
    })
    .await?
}

/// Open the source as a zip archive and hand it to `f`. The archive (and the
/// file handle behind it) is dropped when this returns.
fn with_archive<T>(
    source: &BundleSource,
    f: impl FnOnce(&mut dyn EntryReader) -> Result<T>,
) -> Result<T> {
    match source {
        BundleSource::Path(path) => {
            let file = File::open(path).map_err(|e| {
                ManagerError::archive(format!("Cannot open bundle {}: {}", path.display(), e))
            })?;
            let mut archive = ZipArchive::new(BufReader::new(file))?;
            f(&mut archive)
        }
        BundleSource::Buffer(data) => {
            let mut archive = ZipArchive::new(Cursor::new(data.clone()))?;
            f(&mut archive)
        }
    }
}

/// Object-safe view over a `ZipArchive` regardless of its reader type.
trait EntryReader {
    fn entry_count(&self) -> usize;
    fn entry_name(&mut self, index: usize) -> Result<String>;
    fn entry_text(&mut self, index: usize) -> Result<String>;
}

impl<R: Read + Seek> EntryReader for ZipArchive<R> {
    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entry_name(&mut self, index: usize) -> Result<String> {
        let entry = self.by_index_raw(index)?;
        Ok(entry.name().to_string())
    }

    fn entry_text(&mut self, index: usize) -> Result<String> {
        let mut entry = self.by_index(index)?;
        let name = entry.name().to_string();
        // The declared size comes from the archive header and is not trusted.
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| ManagerError::archive(format!("Failed to read {}: {}", name, e)))?;
        String::from_utf8(buf)
            .map_err(|_| ManagerError::archive(format!("{} is not valid UTF-8 text", name)))
    }
}

fn list_entries_sync(archive: &mut dyn EntryReader) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for i in 0..archive.entry_count() {
        names.insert(archive.entry_name(i)?);
    }
    Ok(names)
}

fn read_entry_text_sync(archive: &mut dyn EntryReader, name: &str) -> Result<Option<String>> {
    for i in 0..archive.entry_count() {
        let entry_name = archive.entry_name(i)?;
        if entry_matches(&entry_name, name) {
            return archive.entry_text(i).map(Some);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("config.json"), "config.json");
        assert_eq!(basename("bundle/certs/ca.crt"), "ca.crt");
        assert_eq!(basename("dir/"), "");
    }

    #[test]
    fn test_entry_matches_is_case_insensitive() {
        assert!(entry_matches("Config.JSON", "config.json"));
        assert!(entry_matches("nested/config.json", "config.json"));
        assert!(!entry_matches("config.json.bak", "config.json"));
        assert!(!entry_matches("myconfig.json", "config.json"));
    }

    #[tokio::test]
    async fn test_list_entries_from_buffer() {
        let data = build_zip(&[("cert", "c"), ("nested/key", "k")]);
        let entries = list_entries(&BundleSource::from(data)).await.unwrap();
        let entries: Vec<_> = entries.into_iter().collect();
        assert_eq!(entries, vec!["cert".to_string(), "nested/key".to_string()]);
    }

    #[tokio::test]
    async fn test_read_entry_text_found_and_missing() {
        let source = BundleSource::from(build_zip(&[("sub/config.json", "{\"host\":\"h\"}")]));

        let text = read_entry_text(&source, "config.json").await.unwrap();
        assert_eq!(text.as_deref(), Some("{\"host\":\"h\"}"));

        let missing = read_entry_text(&source, "cqlshrc").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_inflated_declared_size_is_not_preallocated() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("config.json", stored).unwrap();
        writer.write_all(b"{}").unwrap();
        let mut data = writer.finish().unwrap().into_inner();

        // Central directory uncompressed size sits 24 bytes into the header.
        let central = data
            .windows(4)
            .position(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .unwrap();
        data[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        match read_entry_text(&BundleSource::from(data), "config.json").await {
            Ok(text) => assert_eq!(text.as_deref(), Some("{}")),
            Err(e) => assert!(matches!(e, ManagerError::Archive(_))),
        }
    }

    #[tokio::test]
    async fn test_non_zip_buffer_is_archive_error() {
        let source = BundleSource::from(b"definitely not a zip".to_vec());
        let err = list_entries(&source).await.unwrap_err();
        assert!(matches!(err, ManagerError::Archive(_)));
    }
}
