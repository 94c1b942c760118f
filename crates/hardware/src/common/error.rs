//! Fatal simulation errors.
//!
//! Every variant here is a violated invariant or a misconfiguration; none of them is
//! recoverable. Flow-control refusals (a blocked cache, a busy link) are not errors:
//! the receiver hands the packet back as `Delivery::Refused` and a retry resolves it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::addr::Addr;
use super::packet::MemCmd;

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A request touches bytes in more than one block.
    #[error("access of {size} bytes at {addr} spans multiple {block_size}-byte blocks")]
    SpansMultipleBlocks {
        /// First byte of the access.
        addr: Addr,
        /// Access size in bytes.
        size: usize,
        /// Cache block size in bytes.
        block_size: usize,
    },

    /// A packet command reached a path that cannot service it.
    #[error("unknown packet command {cmd} at {addr}")]
    UnknownCommand {
        /// Offending command.
        cmd: MemCmd,
        /// Packet address.
        addr: Addr,
    },

    /// A send was attempted on a link slot that still holds a buffered packet.
    #[error("{link} link already holds a blocked packet")]
    LinkBusy {
        /// Name of the link slot.
        link: String,
    },

    /// A downstream response arrived while no miss was outstanding.
    #[error("response for {addr} arrived while the cache was not blocked")]
    UnexpectedResponse {
        /// Address of the unexpected response.
        addr: Addr,
    },

    /// A timed access fired with no pending request recorded for it.
    #[error("access to {addr} fired with no pending request")]
    OrphanAccess {
        /// Address of the orphaned access.
        addr: Addr,
    },

    /// A retry notification arrived for a link with nothing buffered.
    #[error("retry on {link} link with no blocked packet")]
    NoBlockedPacket {
        /// Name of the link slot.
        link: String,
    },

    /// A block insert used an address that is not block aligned.
    #[error("insert at {addr} is not aligned to the {block_size}-byte block size")]
    MisalignedInsert {
        /// Insert address.
        addr: Addr,
        /// Cache block size in bytes.
        block_size: usize,
    },

    /// A block insert targeted a block that is already resident.
    #[error("block {addr} is already resident")]
    DuplicateInsert {
        /// Resident block address.
        addr: Addr,
    },

    /// Block data did not fill exactly one block.
    #[error("block {addr} supplied {len} bytes, expected {block_size}")]
    PartialBlock {
        /// Block address.
        addr: Addr,
        /// Bytes supplied.
        len: usize,
        /// Cache block size in bytes.
        block_size: usize,
    },

    /// A port index outside the configured port count.
    #[error("port {port} does not exist ({count} ports configured)")]
    InvalidPort {
        /// Requested port index.
        port: usize,
        /// Number of configured ports.
        count: usize,
    },

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An access trace line could not be parsed.
    #[error("trace line {line}: {reason}")]
    Trace {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A configuration or trace file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A configuration document could not be decoded.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
