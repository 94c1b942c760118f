//! Memory packets exchanged across cache links.
//!
//! A `Packet` is the unit of transfer between requestors, the cache, and backing
//! memory. It carries a command, a target address and size, and an owned payload.
//! Requests are turned into responses in place (`make_response`) so the same
//! allocation travels out and back.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::addr::Addr;
use super::error::CacheError;

/// Command carried by a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemCmd {
    /// Read request; the payload is filled by whoever services it.
    ReadReq,
    /// Response to a `ReadReq`; the payload holds the data read.
    ReadResp,
    /// Write request; the payload holds the bytes to write.
    WriteReq,
    /// Response to a `WriteReq`; the payload still holds the written bytes.
    WriteResp,
    /// Eviction of a block that must be written to the next level; no response.
    WritebackDirty,
    /// A command the cache has no service path for.
    InvalidCmd,
}

impl MemCmd {
    /// Returns `true` for commands that read memory.
    pub const fn is_read(self) -> bool {
        matches!(self, Self::ReadReq | Self::ReadResp)
    }

    /// Returns `true` for commands that carry data to be written.
    pub const fn is_write(self) -> bool {
        matches!(self, Self::WriteReq | Self::WriteResp | Self::WritebackDirty)
    }

    /// Returns `true` for response commands.
    pub const fn is_response(self) -> bool {
        matches!(self, Self::ReadResp | Self::WriteResp)
    }

    /// Returns `true` if the receiver owes the sender a response.
    pub const fn needs_response(self) -> bool {
        matches!(self, Self::ReadReq | Self::WriteReq)
    }

    /// Returns the response command paired with this request, if any.
    pub const fn response_command(self) -> Option<Self> {
        match self {
            Self::ReadReq => Some(Self::ReadResp),
            Self::WriteReq => Some(Self::WriteResp),
            _ => None,
        }
    }
}

impl fmt::Display for MemCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadReq => "ReadReq",
            Self::ReadResp => "ReadResp",
            Self::WriteReq => "WriteReq",
            Self::WriteResp => "WriteResp",
            Self::WritebackDirty => "WritebackDirty",
            Self::InvalidCmd => "InvalidCmd",
        };
        f.write_str(name)
    }
}

/// A memory transaction travelling between components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Identifier chosen by the originator; preserved across upgrades and responses.
    pub id: u64,
    cmd: MemCmd,
    addr: Addr,
    size: usize,
    data: Vec<u8>,
}

impl Packet {
    /// Creates a packet with a zero-filled payload of `size` bytes.
    ///
    /// # Arguments
    ///
    /// * `id` - Originator-chosen identifier.
    /// * `cmd` - Packet command.
    /// * `addr` - First byte accessed.
    /// * `size` - Number of bytes accessed.
    pub fn new(id: u64, cmd: MemCmd, addr: Addr, size: usize) -> Self {
        Self {
            id,
            cmd,
            addr,
            size,
            data: vec![0; size],
        }
    }

    /// Creates a read request for `size` bytes at `addr`.
    pub fn read(id: u64, addr: Addr, size: usize) -> Self {
        Self::new(id, MemCmd::ReadReq, addr, size)
    }

    /// Creates a write request storing `data` at `addr`.
    pub fn write(id: u64, addr: Addr, data: Vec<u8>) -> Self {
        Self {
            id,
            cmd: MemCmd::WriteReq,
            addr,
            size: data.len(),
            data,
        }
    }

    /// Creates a write-back of an evicted block.
    pub fn writeback(addr: Addr, data: Vec<u8>) -> Self {
        Self {
            id: 0,
            cmd: MemCmd::WritebackDirty,
            addr,
            size: data.len(),
            data,
        }
    }

    /// Returns the packet command.
    #[inline]
    pub const fn cmd(&self) -> MemCmd {
        self.cmd
    }

    /// Returns the first address accessed.
    #[inline]
    pub const fn addr(&self) -> Addr {
        self.addr
    }

    /// Returns the number of bytes accessed.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the payload.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the payload mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the packet and returns its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns `true` if the packet reads memory.
    pub const fn is_read(&self) -> bool {
        self.cmd.is_read()
    }

    /// Returns `true` if the packet writes memory.
    pub const fn is_write(&self) -> bool {
        self.cmd.is_write()
    }

    /// Returns `true` if the packet is a response.
    pub const fn is_response(&self) -> bool {
        self.cmd.is_response()
    }

    /// Returns `true` if the packet expects a response.
    pub const fn needs_response(&self) -> bool {
        self.cmd.needs_response()
    }

    /// Converts a request into its response in place.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::UnknownCommand` if the command has no response form.
    pub fn make_response(&mut self) -> Result<(), CacheError> {
        self.cmd = self
            .cmd
            .response_command()
            .ok_or(CacheError::UnknownCommand {
                cmd: self.cmd,
                addr: self.addr,
            })?;
        Ok(())
    }

    /// Returns the address of the block containing the first byte.
    #[inline]
    pub const fn block_addr(&self, block_size: usize) -> Addr {
        self.addr.block_align(block_size)
    }

    /// Returns the offset of the first byte within its block.
    #[inline]
    pub const fn block_offset(&self, block_size: usize) -> usize {
        self.addr.block_offset(block_size)
    }

    /// Returns `true` if every byte accessed lies in a single block.
    pub const fn fits_in_block(&self, block_size: usize) -> bool {
        self.block_offset(block_size) + self.size <= block_size
    }

    /// Returns `true` if the packet covers exactly one whole, aligned block.
    pub const fn is_whole_block(&self, block_size: usize) -> bool {
        self.addr.is_block_aligned(block_size) && self.size == block_size
    }

    /// Copies the accessed bytes out of `block` into the payload.
    ///
    /// The caller guarantees the access fits in the block.
    pub fn set_data_from_block(&mut self, block: &[u8]) {
        let offset = self.block_offset(block.len());
        self.data
            .copy_from_slice(&block[offset..offset + self.size]);
    }

    /// Copies the payload into the accessed bytes of `block`.
    ///
    /// The caller guarantees the access fits in the block.
    pub fn write_data_to_block(&self, block: &mut [u8]) {
        let offset = self.block_offset(block.len());
        block[offset..offset + self.size].copy_from_slice(&self.data);
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:x}:{:x}] id={}",
            self.cmd,
            self.addr.val(),
            self.addr.val().saturating_add(self.size.saturating_sub(1) as u64),
            self.id
        )
    }
}
