use crate::header::{read_u16, Detector};
use crate::{Architecture, Bitness, Format, IdentificationResult};
use byteorder::{BE, LE};
use goblin::elf::header::{
    EI_CLASS, EI_DATA, ELFCLASS32, ELFCLASS64, ELFDATA2MSB, ELFMAG, EM_386, EM_AARCH64, EM_ARM,
    EM_X86_64,
};

/// Offset of `e_machine`, right after `e_ident[16]` and `e_type`.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
const E_MACHINE_OFFSET: usize = 18;

#[derive(Debug, Default, Clone, Copy)]
pub struct ElfDetector;

/// Maps an ELF `e_machine` value to an architecture.
pub fn architecture(machine: u16) -> Architecture {
    match machine {
        EM_386 => Architecture::X86,
        EM_X86_64 => Architecture::X86_64,
        EM_ARM => Architecture::Arm,
        EM_AARCH64 => Architecture::Arm64,
        _ => Architecture::Unknown,
    }
}

fn bitness(class: u8) -> Option<Bitness> {
    match class {
        ELFCLASS32 => Some(Bitness::Bits32),
        ELFCLASS64 => Some(Bitness::Bits64),
        _ => None,
    }
}

impl Detector for ElfDetector {
    fn matches(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(ELFMAG)
    }

    fn detect(&self, bytes: &[u8]) -> IdentificationResult {
        let bits = bytes.get(EI_CLASS).copied().and_then(bitness);

        // e_ident[EI_DATA] decides how every later field is encoded.
        let machine = if bytes.get(EI_DATA) == Some(&ELFDATA2MSB) {
            read_u16::<BE>(bytes, E_MACHINE_OFFSET)
        } else {
            read_u16::<LE>(bytes, E_MACHINE_OFFSET)
        };

        let arch = match machine {
            Some(machine) => {
                log::debug!("ELF e_machine {machine:#x}, class {bits:?}");
                architecture(machine)
            }
            None => {
                log::warn!("ELF header truncated at {} bytes", bytes.len());
                Architecture::Unknown
            }
        };

        IdentificationResult::detected(Format::LinuxElf, arch, bits)
    }

    fn format_name(&self) -> &'static str {
        "ELF"
    }
}
