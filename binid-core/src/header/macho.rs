use crate::header::{read_u32, Detector};
use crate::{Architecture, Bitness, Format, IdentificationResult};
use byteorder::{BE, LE};
use goblin::mach::cputype::{CPU_ARCH_ABI64, CPU_ARCH_MASK, CPU_TYPE_ARM, CPU_TYPE_X86};
use goblin::mach::fat::{FAT_CIGAM, FAT_MAGIC};
use goblin::mach::header::{MH_CIGAM, MH_CIGAM_64, MH_MAGIC, MH_MAGIC_64};

/// `cputype` in a thin header, `nfat_arch` in a fat one.
const CPUTYPE_OFFSET: usize = 4;

/// `cputype` of the first `fat_arch` entry, right after the 8-byte fat header.
const FAT_FIRST_CPUTYPE_OFFSET: usize = 8;

/// Which of the Mach-O magic numbers a buffer starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Magic {
    Thin { is_64: bool, big_endian: bool },
    Fat { big_endian: bool },
}

impl Magic {
    /// The magic constants are compared against the leading bytes read
    /// big-endian; a byte-swapped constant means the file's fields are
    /// little-endian. The host byte order never enters into it.
    fn parse(bytes: &[u8]) -> Option<Self> {
        let magic = read_u32::<BE>(bytes, 0)?;
        let parsed = match magic {
            MH_MAGIC => Magic::Thin { is_64: false, big_endian: true },
            MH_CIGAM => Magic::Thin { is_64: false, big_endian: false },
            MH_MAGIC_64 => Magic::Thin { is_64: true, big_endian: true },
            MH_CIGAM_64 => Magic::Thin { is_64: true, big_endian: false },
            FAT_MAGIC => Magic::Fat { big_endian: true },
            FAT_CIGAM => Magic::Fat { big_endian: false },
            _ => return None,
        };
        Some(parsed)
    }

    fn read_u32(&self, bytes: &[u8], offset: usize) -> Option<u32> {
        let big_endian = match *self {
            Magic::Thin { big_endian, .. } | Magic::Fat { big_endian } => big_endian,
        };
        if big_endian {
            read_u32::<BE>(bytes, offset)
        } else {
            read_u32::<LE>(bytes, offset)
        }
    }
}

/// Thin and fat (universal) Mach-O images.
///
/// Fat images are only classified by their first architecture slice.
#[derive(Debug, Default, Clone, Copy)]
pub struct MachODetector;

/// Maps a Mach-O `cputype` to an architecture.
///
/// The ABI64 capability bit is stripped before the lookup and counts as
/// 64-bit on its own, so both `CPU_TYPE_ARM` under a 64-bit magic and a
/// literal `CPU_TYPE_ARM64` yield [`Architecture::Arm64`].
pub fn architecture(cputype: u32, is_64: bool) -> Architecture {
    let is_64 = is_64 || cputype & CPU_ARCH_ABI64 != 0;
    match cputype & !CPU_ARCH_MASK {
        CPU_TYPE_X86 if is_64 => Architecture::X86_64,
        CPU_TYPE_X86 => Architecture::X86,
        CPU_TYPE_ARM if is_64 => Architecture::Arm64,
        CPU_TYPE_ARM => Architecture::Arm,
        _ => Architecture::Unknown,
    }
}

fn bitness(cputype: u32, is_64: bool) -> Bitness {
    Bitness::from_is_64(is_64 || cputype & CPU_ARCH_ABI64 != 0)
}

impl Detector for MachODetector {
    fn matches(&self, bytes: &[u8]) -> bool {
        Magic::parse(bytes).is_some()
    }

    fn detect(&self, bytes: &[u8]) -> IdentificationResult {
        let Some(magic) = Magic::parse(bytes) else {
            return IdentificationResult::unknown();
        };

        let (cputype, is_64) = match magic {
            Magic::Thin { is_64, .. } => (magic.read_u32(bytes, CPUTYPE_OFFSET), is_64),
            Magic::Fat { .. } => {
                let nfat_arch = magic.read_u32(bytes, CPUTYPE_OFFSET).unwrap_or(0);
                log::debug!("Fat Mach-O with {nfat_arch} slices");
                let first = if nfat_arch == 0 {
                    None
                } else {
                    magic.read_u32(bytes, FAT_FIRST_CPUTYPE_OFFSET)
                };
                (first, false)
            }
        };

        let Some(cputype) = cputype else {
            log::warn!("Mach-O header has no readable cputype ({magic:?})");
            return IdentificationResult::detected(Format::MacOs, Architecture::Unknown, None);
        };

        log::debug!("Mach-O cputype {cputype:#x} ({magic:?})");
        let arch = architecture(cputype, is_64);
        let bits = (arch != Architecture::Unknown).then(|| bitness(cputype, is_64));
        IdentificationResult::detected(Format::MacOs, arch, bits)
    }

    fn format_name(&self) -> &'static str {
        "Mach-O"
    }
}
