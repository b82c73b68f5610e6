use std::fmt;

/// Executable container format recognised from a file's magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `MZ` header pointing at a valid `PE\0\0` signature.
    WindowsOrEfi,
    /// `MZ` header without a reachable PE signature.
    WindowsOrDos,
    LinuxElf,
    /// Thin or fat (universal) Mach-O.
    MacOs,
    Unknown,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::WindowsOrEfi => "Windows or EFI Program",
            Format::WindowsOrDos => "Windows or DOS Program",
            Format::LinuxElf => "Linux Executable",
            Format::MacOs => "macOS Executable",
            Format::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Architecture {
    X86,
    X86_64,
    Arm,
    Arm64,
    Unknown,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Architecture::X86 => "x86",
            Architecture::X86_64 => "x86_64",
            Architecture::Arm => "ARM",
            Architecture::Arm64 => "ARM64",
            Architecture::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

/// Whether the architecture was read from a machine field or guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Confidence {
    #[default]
    Detected,
    /// No machine field exists (plain DOS executables).
    Assumed,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Detected => write!(f, "detected"),
            Confidence::Assumed => write!(f, "assumed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    pub fn from_is_64(is_64: bool) -> Self {
        if is_64 {
            Bitness::Bits64
        } else {
            Bitness::Bits32
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            Bitness::Bits32 => 32,
            Bitness::Bits64 => 64,
        }
    }
}

impl fmt::Display for Bitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Outcome of a single identification.
///
/// An `Unknown` format always carries an `Unknown` architecture and no
/// bitness; the constructors below are the only way to build one, which
/// keeps that pairing intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentificationResult {
    pub format: Format,
    pub architecture: Architecture,
    pub confidence: Confidence,
    pub bitness: Option<Bitness>,
}

impl IdentificationResult {
    pub fn unknown() -> Self {
        Self {
            format: Format::Unknown,
            architecture: Architecture::Unknown,
            confidence: Confidence::Detected,
            bitness: None,
        }
    }

    pub fn detected(format: Format, architecture: Architecture, bitness: Option<Bitness>) -> Self {
        if format == Format::Unknown {
            return Self::unknown();
        }
        Self {
            format,
            architecture,
            confidence: Confidence::Detected,
            bitness,
        }
    }

    pub fn assumed(format: Format, architecture: Architecture) -> Self {
        if format == Format::Unknown {
            return Self::unknown();
        }
        Self {
            format,
            architecture,
            confidence: Confidence::Assumed,
            bitness: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.format != Format::Unknown
    }

    /// Human-readable architecture label, e.g. `x86 (assumed)` or `x86-32`.
    ///
    /// ELF x86 images carry their class as a suffix (`?` when the class
    /// byte is not recognised); every other combination renders the plain
    /// architecture name.
    pub fn describe_architecture(&self) -> String {
        match (self.confidence, self.format, self.architecture) {
            (Confidence::Assumed, _, arch) => format!("{arch} (assumed)"),
            (_, Format::LinuxElf, Architecture::X86) => match self.bitness {
                Some(bitness) => format!("x86-{}", bitness.bits()),
                None => "x86-?".to_string(),
            },
            (_, _, arch) => arch.to_string(),
        }
    }
}

impl Default for IdentificationResult {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for IdentificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.format, self.describe_architecture())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_forces_unknown_architecture() {
        let result = IdentificationResult::detected(
            Format::Unknown,
            Architecture::Arm64,
            Some(Bitness::Bits64),
        );
        assert_eq!(result, IdentificationResult::unknown());
        assert_eq!(result.architecture, Architecture::Unknown);
        assert_eq!(result.bitness, None);
    }

    #[test]
    fn assumed_architecture_is_labelled() {
        let result = IdentificationResult::assumed(Format::WindowsOrDos, Architecture::X86);
        assert_eq!(result.confidence, Confidence::Assumed);
        assert_eq!(result.describe_architecture(), "x86 (assumed)");
        assert_eq!(result.to_string(), "Windows or DOS Program (x86 (assumed))");
    }

    #[test]
    fn elf_x86_carries_class_suffix() {
        let r32 = IdentificationResult::detected(
            Format::LinuxElf,
            Architecture::X86,
            Some(Bitness::Bits32),
        );
        let unclassed = IdentificationResult::detected(Format::LinuxElf, Architecture::X86, None);
        assert_eq!(r32.describe_architecture(), "x86-32");
        assert_eq!(unclassed.describe_architecture(), "x86-?");

        let pe = IdentificationResult::detected(
            Format::WindowsOrEfi,
            Architecture::X86,
            Some(Bitness::Bits32),
        );
        assert_eq!(pe.describe_architecture(), "x86");
    }
}
