use crate::header::{field, read_u16, read_u32, Detector};
use crate::{Architecture, Bitness, Format, IdentificationResult};
use byteorder::LE;
use goblin::pe::header::{
    COFF_MACHINE_ARM, COFF_MACHINE_ARM64, COFF_MACHINE_X86, COFF_MACHINE_X86_64, DOS_MAGIC,
    PE_MAGIC, PE_POINTER_OFFSET,
};
use goblin::pe::optional_header::{MAGIC_32, MAGIC_64};

/// Offset of the COFF `Machine` field from the start of the PE signature.
const MACHINE_OFFSET: usize = 4;

/// Offset of the optional header magic from the start of the PE signature
/// (4-byte signature + 20-byte COFF file header).
const OPTIONAL_MAGIC_OFFSET: usize = 24;

/// DOS `MZ` executables and the PE images they may wrap.
///
/// The DOS header has no machine field, so anything that carries `MZ` but
/// no reachable `PE\0\0` signature is reported as x86 with
/// [`Confidence::Assumed`](crate::Confidence::Assumed).
#[derive(Debug, Default, Clone, Copy)]
pub struct PeDetector;

impl PeDetector {
    /// Returns the offset of the `PE\0\0` signature if the DOS header points
    /// at one inside the buffer.
    fn pe_offset(bytes: &[u8]) -> Option<usize> {
        let pointer = read_u32::<LE>(bytes, PE_POINTER_OFFSET as usize)?;
        let offset = usize::try_from(pointer).ok()?;
        let signature = read_u32::<LE>(bytes, offset)?;
        (signature == PE_MAGIC).then_some(offset)
    }
}

/// Maps a COFF machine type to an architecture.
pub fn architecture(machine: u16) -> Architecture {
    match machine {
        COFF_MACHINE_X86 => Architecture::X86,
        COFF_MACHINE_X86_64 => Architecture::X86_64,
        COFF_MACHINE_ARM => Architecture::Arm,
        COFF_MACHINE_ARM64 => Architecture::Arm64,
        _ => Architecture::Unknown,
    }
}

fn bitness(optional_magic: u16) -> Option<Bitness> {
    match optional_magic {
        MAGIC_32 => Some(Bitness::Bits32),
        MAGIC_64 => Some(Bitness::Bits64),
        _ => None,
    }
}

impl Detector for PeDetector {
    fn matches(&self, bytes: &[u8]) -> bool {
        read_u16::<LE>(bytes, 0) == Some(DOS_MAGIC)
    }

    fn detect(&self, bytes: &[u8]) -> IdentificationResult {
        let Some(offset) = Self::pe_offset(bytes) else {
            if field(bytes, PE_POINTER_OFFSET as usize, 4).is_none() {
                log::warn!("MZ header truncated before PE pointer; assuming DOS");
            } else {
                log::debug!("No PE signature behind MZ header; assuming DOS");
            }
            return IdentificationResult::assumed(Format::WindowsOrDos, Architecture::X86);
        };

        let arch = match read_u16::<LE>(bytes, offset + MACHINE_OFFSET) {
            Some(machine) => {
                log::debug!("PE signature at {offset:#x}, machine {machine:#06x}");
                architecture(machine)
            }
            None => {
                log::warn!("PE signature at {offset:#x} but machine field is truncated");
                Architecture::Unknown
            }
        };
        let bits = read_u16::<LE>(bytes, offset + OPTIONAL_MAGIC_OFFSET).and_then(bitness);

        IdentificationResult::detected(Format::WindowsOrEfi, arch, bits)
    }

    fn format_name(&self) -> &'static str {
        "PE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Confidence;

    fn pe_image(pe_offset: u32, machine: u16, optional_magic: u16) -> Vec<u8> {
        let mut buf = vec![0u8; 0x100];
        buf[0..2].copy_from_slice(b"MZ");
        buf[0x3C..0x40].copy_from_slice(&pe_offset.to_le_bytes());
        let off = pe_offset as usize;
        buf[off..off + 4].copy_from_slice(b"PE\0\0");
        buf[off + 4..off + 6].copy_from_slice(&machine.to_le_bytes());
        buf[off + 24..off + 26].copy_from_slice(&optional_magic.to_le_bytes());
        buf
    }

    #[test]
    fn machine_table() {
        assert_eq!(architecture(0x014c), Architecture::X86);
        assert_eq!(architecture(0x8664), Architecture::X86_64);
        assert_eq!(architecture(0x01c0), Architecture::Arm);
        assert_eq!(architecture(0xAA64), Architecture::Arm64);
        assert_eq!(architecture(0x0200), Architecture::Unknown);
    }

    #[test]
    fn pe32_plus_amd64() {
        let result = PeDetector.detect(&pe_image(0x80, 0x8664, 0x20b));
        assert_eq!(result.format, Format::WindowsOrEfi);
        assert_eq!(result.architecture, Architecture::X86_64);
        assert_eq!(result.confidence, Confidence::Detected);
        assert_eq!(result.bitness, Some(Bitness::Bits64));
    }

    #[test]
    fn pe32_i386() {
        let result = PeDetector.detect(&pe_image(0x40, 0x014c, 0x10b));
        assert_eq!(result.architecture, Architecture::X86);
        assert_eq!(result.bitness, Some(Bitness::Bits32));
    }

    #[test]
    fn signature_without_optional_header_has_no_bitness() {
        let mut buf = pe_image(0x40, 0xAA64, 0x20b);
        buf.truncate(0x46);
        let result = PeDetector.detect(&buf);
        assert_eq!(result.format, Format::WindowsOrEfi);
        assert_eq!(result.architecture, Architecture::Arm64);
        assert_eq!(result.bitness, None);
    }

    #[test]
    fn truncated_machine_field_is_unknown() {
        let mut buf = pe_image(0x40, 0x8664, 0x20b);
        buf.truncate(0x45);
        let result = PeDetector.detect(&buf);
        assert_eq!(result.format, Format::WindowsOrEfi);
        assert_eq!(result.architecture, Architecture::Unknown);
    }

    #[test]
    fn pointer_past_end_falls_back_to_dos() {
        let mut buf = vec![0u8; 64];
        buf[0..2].copy_from_slice(b"MZ");
        buf[0x3C..0x40].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        let result = PeDetector.detect(&buf);
        assert_eq!(result.format, Format::WindowsOrDos);
        assert_eq!(result.architecture, Architecture::X86);
        assert_eq!(result.confidence, Confidence::Assumed);
    }

    #[test]
    fn short_mz_falls_back_to_dos() {
        let result = PeDetector.detect(b"MZ\x90\x00");
        assert_eq!(result.format, Format::WindowsOrDos);
        assert_eq!(result.confidence, Confidence::Assumed);
    }
}
