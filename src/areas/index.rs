//! Staging index
//!
//! The files that make up the next commit, with the blob id and stat data of
//! each, persisted at `.git/index` in the `DIRC` version-2 layout described
//! in [`crate::artifacts::index`].
//!
//! The index is never edited in place: staging and resetting both rebuild it
//! from the working tree or from a commit and replace every entry at once.

use crate::artifacts::index::index_entry::{ENTRY_BLOCK, ENTRY_MIN_SIZE, IndexEntry};
use crate::artifacts::objects::object::{Packable, Unpackable};
use anyhow::{Context, anyhow};
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

const SIGNATURE: &[u8; 4] = b"DIRC";
const VERSION: u32 = 2;
const HEADER_SIZE: usize = 12;
const CHECKSUM_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct Index {
    path: Box<Path>,
    entries: BTreeMap<Box<Path>, IndexEntry>,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by path.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Swap the whole entry set; nothing reaches disk before
    /// [`Index::write_updates`].
    pub fn replace(&mut self, entries: impl IntoIterator<Item = IndexEntry>) {
        self.entries = entries
            .into_iter()
            .map(|entry| (entry.name.clone().into_boxed_path(), entry))
            .collect();
    }

    /// Load the index under a shared lock, verifying the checksum.
    ///
    /// A missing or empty file is an empty index.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.entries.clear();

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .with_context(|| format!("Unable to open index {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        if lock.metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = HashingStream::new(&mut *lock);
        let entries_count = parse_header(&reader.read(HEADER_SIZE)?)?;

        for _ in 0..entries_count {
            // entries are NUL-terminated and padded to whole blocks
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?;
            while entry_bytes.last() != Some(&0) {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::deserialize(std::io::Cursor::new(entry_bytes))?;
            self.entries.insert(entry.name.clone().into_boxed_path(), entry);
        }

        reader.verify()
    }

    /// Persist every entry under an exclusive lock.
    pub fn write_updates(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("Unable to open index {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = HashingStream::new(&mut *lock);
        writer.write(&pack_header(self.entries.len())?)?;
        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }

        writer.finish()
    }
}

fn pack_header(entries_count: usize) -> anyhow::Result<Vec<u8>> {
    let entries_count = u32::try_from(entries_count).context("Too many index entries")?;

    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(SIGNATURE);
    header.write_u32::<NetworkEndian>(VERSION)?;
    header.write_u32::<NetworkEndian>(entries_count)?;

    Ok(header)
}

/// Entry count of a valid header.
fn parse_header(header: &[u8]) -> anyhow::Result<u32> {
    if header.len() < HEADER_SIZE || &header[..4] != SIGNATURE {
        return Err(anyhow!("Invalid index file signature"));
    }

    let version = NetworkEndian::read_u32(&header[4..8]);
    if version != VERSION {
        return Err(anyhow!("Unsupported index file version: {version}"));
    }

    Ok(NetworkEndian::read_u32(&header[8..12]))
}

/// Runs every byte read or written through SHA-1, for the trailing checksum.
struct HashingStream<S> {
    stream: S,
    digest: Sha1,
}

impl<S> HashingStream<S> {
    fn new(stream: S) -> Self {
        HashingStream {
            stream,
            digest: Sha1::new(),
        }
    }
}

impl<S: Read> HashingStream<S> {
    fn read(&mut self, size: usize) -> anyhow::Result<Vec<u8>> {
        let mut buffer = vec![0; size];
        self.stream
            .read_exact(&mut buffer)
            .context("Unexpected end-of-file while reading index")?;

        self.digest.update(&buffer);
        Ok(buffer)
    }

    fn verify(mut self) -> anyhow::Result<()> {
        let mut stored = [0u8; CHECKSUM_SIZE];
        self.stream
            .read_exact(&mut stored)
            .context("Index file has no checksum")?;

        let computed = self.digest.finalize();
        if stored.as_slice() != computed.as_slice() {
            return Err(anyhow!("Checksum does not match value stored on disk"));
        }

        Ok(())
    }
}

impl<S: Write> HashingStream<S> {
    fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    fn finish(mut self) -> anyhow::Result<()> {
        let checksum = self.digest.finalize();
        self.stream
            .write_all(checksum.as_slice())
            .context("Failed to write checksum to index file")?;

        Ok(self.stream.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::index_entry::EntryMetadata;
    use crate::artifacts::objects::object_id::ObjectId;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const OID: &str = "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0";

    fn entry(name: &str) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(name),
            ObjectId::try_parse(OID.to_string()).unwrap(),
            EntryMetadata {
                size: 5,
                ..Default::default()
            },
        )
    }

    fn names(index: &Index) -> Vec<PathBuf> {
        index.entries().map(|entry| entry.name.clone()).collect()
    }

    #[test]
    fn written_index_rehydrates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".git").join("index");

        let mut index = Index::new(path.clone().into_boxed_path());
        index.replace([entry("dir/b.txt"), entry("a.txt")]);
        index.write_updates().unwrap();

        let mut reloaded = Index::new(path.into_boxed_path());
        reloaded.rehydrate().unwrap();

        assert_eq!(names(&reloaded), vec![PathBuf::from("a.txt"), PathBuf::from("dir/b.txt")]);
    }

    #[test]
    fn written_header_is_dirc_version_two() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        let mut index = Index::new(path.clone().into_boxed_path());
        index.replace([entry("a.txt"), entry("b.txt")]);
        index.write_updates().unwrap();

        let bytes = std::fs::read(&path).unwrap();

        assert_eq!(&bytes[..12], b"DIRC\x00\x00\x00\x02\x00\x00\x00\x02");
    }

    #[test]
    fn replace_drops_previous_entries() {
        let dir = TempDir::new().unwrap();
        let mut index = Index::new(dir.path().join("index").into_boxed_path());
        index.replace([entry("a.txt"), entry("nested/b.txt")]);

        index.replace([entry("nested")]);

        assert_eq!(names(&index), vec![PathBuf::from("nested")]);
    }

    #[test]
    fn missing_index_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut index = Index::new(dir.path().join("index").into_boxed_path());

        index.rehydrate().unwrap();

        assert!(index.is_empty());
    }

    #[test]
    fn corrupted_index_fails_checksum() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        let mut index = Index::new(path.clone().into_boxed_path());
        index.replace([entry("a.txt")]);
        index.write_updates().unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        assert!(Index::new(path.into_boxed_path()).rehydrate().is_err());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        std::fs::write(&path, b"PACK\x00\x00\x00\x02\x00\x00\x00\x00").unwrap();

        let error = Index::new(path.into_boxed_path()).rehydrate().unwrap_err();

        assert!(error.to_string().contains("signature"));
    }
}
