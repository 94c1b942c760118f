//! Access trace loading.
//!
//! Traces drive the requestors from a text file, one access per line:
//!
//! ```text
//! # port  op  addr     size
//! 0       R   0x1000   64
//! 1       W   0x1004   4
//! ```
//!
//! Blank lines and `#` comments are ignored. Writes carry a deterministic payload
//! (`write_pattern`) so reads of the same bytes can be checked afterwards.

use std::fs;
use std::path::Path;

use crate::common::{Addr, CacheError, Packet};

/// One trace access bound for a CPU-side port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// CPU-side port the access is issued on.
    pub port: usize,
    /// Request packet; ids count up from 1 in file order.
    pub packet: Packet,
}

/// Payload written by trace writes: byte `i` is the low byte of `addr + i`.
pub fn write_pattern(addr: Addr, size: usize) -> Vec<u8> {
    (0..size as u64)
        .map(|i| addr.val().wrapping_add(i) as u8)
        .collect()
}

/// Parses trace text.
///
/// # Errors
///
/// Returns `CacheError::Trace` naming the first malformed line.
pub fn parse_trace(text: &str) -> Result<Vec<TraceEntry>, CacheError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let lineno = idx + 1;
        let bad = |reason: String| CacheError::Trace {
            line: lineno,
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[port, op, addr, size] = fields.as_slice() else {
            return Err(bad(format!("expected 4 fields, found {}", fields.len())));
        };

        let port: usize = port
            .parse()
            .map_err(|_| bad(format!("bad port '{port}'")))?;
        let digits = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .unwrap_or(addr);
        let addr = u64::from_str_radix(digits, 16)
            .map(Addr::new)
            .map_err(|_| bad(format!("bad address '{addr}'")))?;
        let size: usize = size
            .parse()
            .map_err(|_| bad(format!("bad size '{size}'")))?;
        if size == 0 {
            return Err(bad("zero-sized access".to_string()));
        }

        let id = entries.len() as u64 + 1;
        let packet = match op {
            "R" | "r" => Packet::read(id, addr, size),
            "W" | "w" => Packet::write(id, addr, write_pattern(addr, size)),
            other => return Err(bad(format!("unknown op '{other}'"))),
        };
        entries.push(TraceEntry { port, packet });
    }
    Ok(entries)
}

/// Reads and parses a trace file.
///
/// # Errors
///
/// Returns `CacheError::Io` if the file cannot be read, or `CacheError::Trace`.
pub fn load_trace(path: &Path) -> Result<Vec<TraceEntry>, CacheError> {
    let text = fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(&text)
}
