//! Binary snapshots of a trie's live entries.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic    b"TTRI"
//! version  u32
//! count    u64
//! count x {
//!     term_len  u32, term bytes (UTF-8)
//!     score     f32
//!     payload_len u32 (u32::MAX: no payload), payload bytes
//! }
//! ```
//!
//! Entries are written in code-point order, so loading rebuilds the same
//! structure as the trie that was saved, minus its tombstones.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use memmap2::Mmap;
use termtrie::{AddMode, Trie, Visibility};

use crate::error::{Result, SuggestError};

pub const MAGIC: &[u8; 4] = b"TTRI";
pub const VERSION: u32 = 1;
const NO_PAYLOAD: u32 = u32::MAX;
const HEADER_LEN: usize = 4 + 4 + 8;

/// Write every live entry of `trie` to `w`. Returns the number of entries.
pub fn write_to<W: Write>(trie: &Trie, mut w: W) -> io::Result<u64> {
    w.write_all(MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&(trie.len() as u64).to_le_bytes())?;

    let mut term = String::new();
    let mut written = 0u64;
    let mut result = Ok(());
    trie.visit(Visibility::Live, |entry| {
        if result.is_err() {
            return;
        }
        term.clear();
        term.extend(entry.term);
        result = write_entry(&mut w, &term, entry.score, entry.payload);
        written += 1;
    });
    result?;
    w.flush()?;
    Ok(written)
}

fn write_entry<W: Write>(w: &mut W, term: &str, score: f32, payload: Option<&[u8]>) -> io::Result<()> {
    w.write_all(&(term.len() as u32).to_le_bytes())?;
    w.write_all(term.as_bytes())?;
    w.write_all(&score.to_le_bytes())?;
    match payload {
        Some(p) => {
            let len = payload_len(p.len())?;
            w.write_all(&len.to_le_bytes())?;
            w.write_all(p)?;
        }
        None => w.write_all(&NO_PAYLOAD.to_le_bytes())?,
    }
    Ok(())
}

/// Payload lengths must fit a `u32` and stay below the no-payload marker.
fn payload_len(len: usize) -> io::Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|len| *len != NO_PAYLOAD)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("payload of {} bytes is too large for a snapshot", len),
            )
        })
}

pub fn encode(trie: &Trie) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + trie.len() * 16);
    // Writing to a Vec cannot fail.
    let _ = write_to(trie, &mut out);
    out
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, reason: &'static str) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(n).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let out = &self.bytes[self.offset..end];
                self.offset = end;
                Ok(out)
            }
            None => Err(SuggestError::Corrupt {
                offset: self.offset,
                reason,
            }),
        }
    }

    fn array<const N: usize>(&mut self, reason: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, reason)?);
        Ok(out)
    }

    fn u32(&mut self, reason: &'static str) -> Result<u32> {
        self.array(reason).map(u32::from_le_bytes)
    }

    fn u64(&mut self, reason: &'static str) -> Result<u64> {
        self.array(reason).map(u64::from_le_bytes)
    }

    fn f32(&mut self, reason: &'static str) -> Result<f32> {
        self.array(reason).map(f32::from_le_bytes)
    }
}

/// Rebuild a trie from snapshot bytes.
///
/// Entries the trie rejects (bad score, empty or oversized term) are
/// skipped with a warning. Structural damage is an error.
pub fn decode(bytes: &[u8]) -> Result<Trie> {
    let mut r = Reader { bytes, offset: 0 };
    if r.take(MAGIC.len(), "truncated header")? != MAGIC {
        return Err(SuggestError::Corrupt {
            offset: 0,
            reason: "bad magic",
        });
    }
    let version = r.u32("truncated header")?;
    if version != VERSION {
        return Err(SuggestError::UnsupportedVersion(version));
    }
    let count = r.u64("truncated header")?;

    let mut trie = Trie::new();
    let mut skipped = 0usize;
    for _ in 0..count {
        let start = r.offset;
        let term_len = r.u32("truncated entry")? as usize;
        let term = std::str::from_utf8(r.take(term_len, "truncated term")?).map_err(|_| {
            SuggestError::Corrupt {
                offset: start + 4,
                reason: "term is not valid UTF-8",
            }
        })?;
        let score = r.f32("truncated entry")?;
        let payload = match r.u32("truncated entry")? {
            NO_PAYLOAD => None,
            len => Some(r.take(len as usize, "truncated payload")?),
        };
        if let Err(e) = trie.add(term, score, payload, AddMode::Replace) {
            warn!("snapshot entry at byte {} skipped: {}", start, e);
            skipped += 1;
        }
    }
    if r.offset != bytes.len() {
        return Err(SuggestError::Corrupt {
            offset: r.offset,
            reason: "trailing bytes",
        });
    }
    debug!("snapshot decoded: {} entries, {} skipped", trie.len(), skipped);
    Ok(trie)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a snapshot to `path` atomically: a sibling temporary file is
/// written and synced, then renamed over `path`.
pub fn save_file(trie: &Trie, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let tmp = temp_path(path);
    let file = File::create(&tmp)?;
    let mut w = BufWriter::new(file);
    let written = write_to(trie, &mut w)?;
    let file = w.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    debug!("snapshot saved to {}: {} entries", path.display(), written);
    Ok(())
}

/// Load a snapshot written by [`save_file`], reading it through a memory map.
pub fn open_file(path: impl AsRef<Path>) -> Result<Trie> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if file.metadata()?.len() < HEADER_LEN as u64 {
        return Err(SuggestError::Corrupt {
            offset: 0,
            reason: "truncated header",
        });
    }
    // The file is only read while mapped and is replaced by rename, never
    // rewritten in place.
    let map = unsafe { Mmap::map(&file)? };
    decode(&map)
}
