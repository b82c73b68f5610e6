pub mod elf;
pub mod macho;
pub mod pe;

use crate::IdentificationResult;
use byteorder::ByteOrder;

pub trait Detector: std::fmt::Debug + Send + Sync {
    /// Returns true if the buffer starts with this format's magic number.
    fn matches(&self, bytes: &[u8]) -> bool;

    /// Classifies a buffer already accepted by [`Detector::matches`].
    ///
    /// Must not panic on truncated input; missing fields degrade to the
    /// least specific classification for the format.
    fn detect(&self, bytes: &[u8]) -> IdentificationResult;

    /// Returns a short name, e.g. "ELF" or "PE".
    fn format_name(&self) -> &'static str;
}

/// Returns `len` bytes at `offset`, or `None` if any of them lie outside `bytes`.
pub(crate) fn field(bytes: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    let end = offset.checked_add(len)?;
    bytes.get(offset..end)
}

pub(crate) fn read_u16<B: ByteOrder>(bytes: &[u8], offset: usize) -> Option<u16> {
    field(bytes, offset, 2).map(B::read_u16)
}

pub(crate) fn read_u32<B: ByteOrder>(bytes: &[u8], offset: usize) -> Option<u32> {
    field(bytes, offset, 4).map(B::read_u32)
}
