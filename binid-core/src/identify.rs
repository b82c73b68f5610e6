use crate::header::elf::ElfDetector;
use crate::header::macho::MachODetector;
use crate::header::pe::PeDetector;
use crate::header::Detector;
use crate::IdentificationResult;

/// Shortest buffer any detector may classify; every magic is checked
/// against at least this many bytes.
pub const MIN_MAGIC_BYTES: usize = 4;

/// Detectors in dispatch order. The magics are disjoint, so order only
/// matters for readability: most common first.
static DETECTORS: [&dyn Detector; 3] = [&PeDetector, &ElfDetector, &MachODetector];

/// Identifies the container format and CPU architecture of `bytes`.
///
/// `bytes` should hold at least the first 64 bytes of the file; PE images
/// additionally need the bytes the DOS header points at. Never fails:
/// unrecognised or truncated input yields the least specific
/// classification available, down to [`IdentificationResult::unknown`].
pub fn identify(bytes: &[u8]) -> IdentificationResult {
    if bytes.len() < MIN_MAGIC_BYTES {
        log::debug!("{} bytes is too short to identify", bytes.len());
        return IdentificationResult::unknown();
    }

    match DETECTORS.iter().find(|d| d.matches(bytes)) {
        Some(detector) => {
            let result = detector.detect(bytes);
            log::debug!("{} detector: {result}", detector.format_name());
            result
        }
        None => {
            log::debug!("No magic number matched in {} bytes", bytes.len());
            IdentificationResult::unknown()
        }
    }
}

/// Name of the detector that claims `bytes`, if any.
pub fn detector_name(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < MIN_MAGIC_BYTES {
        return None;
    }
    DETECTORS
        .iter()
        .find(|d| d.matches(bytes))
        .map(|d| d.format_name())
}
