use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::scanner::records::FileRecord;

/// Size of the quick hash prefix (first 4KB)
pub const QUICK_HASH_SIZE: usize = 4096;

/// Read size for streaming hashes
pub const CHUNK_SIZE: usize = 8192;

/// SHA-256 of the first 4KB of a file
pub fn quick_hash(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut buffer = vec![0u8; QUICK_HASH_SIZE];
    let mut filled = 0;
    while filled < QUICK_HASH_SIZE {
        let n = file
            .read(&mut buffer[filled..])
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let mut hasher = Sha256::new();
    hasher.update(&buffer[..filled]);
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 of the whole file, streamed in fixed chunks
pub fn full_hash(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Pass 1: bucket record indices by exact size.
///
/// Only sizes strictly above `min_size` take part and single-file buckets
/// are dropped, since a unique size cannot have a duplicate.
pub fn bucket_by_size(records: &[FileRecord], min_size: u64) -> BTreeMap<u64, Vec<usize>> {
    let mut buckets: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        if record.size > min_size {
            buckets.entry(record.size).or_default().push(idx);
        }
    }
    buckets.retain(|_, v| v.len() > 1);
    buckets
}

/// Outcome of hashing one candidate set
#[derive(Debug, Default)]
pub struct HashedSet {
    /// Every index that received a full digest
    pub digests: Vec<(usize, String)>,
    pub errors: Vec<String>,
}

impl HashedSet {
    /// Digest groups with two or more members
    pub fn groups(&self) -> Vec<(String, Vec<usize>)> {
        let mut by_hash: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, digest) in &self.digests {
            by_hash.entry(digest.as_str()).or_default().push(*idx);
        }
        let mut groups: Vec<(String, Vec<usize>)> = by_hash
            .into_iter()
            .filter(|(_, v)| v.len() > 1)
            .map(|(h, v)| (h.to_string(), v))
            .collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        groups
    }
}

/// Passes 2 and 3 for one size bucket: drop files whose first 4KB differ
/// from every other member, then fully hash the survivors.
pub fn hash_bucket(records: &[FileRecord], size: u64, members: &[usize]) -> HashedSet {
    let mut set = HashedSet::default();

    let candidates: Vec<usize> = if size as usize <= QUICK_HASH_SIZE {
        // The prefix is the whole file; go straight to the full hash
        members.to_vec()
    } else {
        let mut by_prefix: HashMap<String, Vec<usize>> = HashMap::new();
        for &idx in members {
            match quick_hash(&records[idx].path) {
                Ok(h) => by_prefix.entry(h).or_default().push(idx),
                Err(e) => set.errors.push(format!("Hash failed: {:#}", e)),
            }
        }
        let mut survivors: Vec<usize> = by_prefix
            .into_values()
            .filter(|v| v.len() > 1)
            .flatten()
            .collect();
        survivors.sort_unstable();
        survivors
    };

    for idx in candidates {
        match full_hash(&records[idx].path) {
            Ok(h) => set.digests.push((idx, h)),
            Err(e) => set.errors.push(format!("Hash failed: {:#}", e)),
        }
    }

    set
}
