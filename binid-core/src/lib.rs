pub mod format;
pub mod header;
pub mod identify;
pub mod probe;

pub use format::*;
pub use header::Detector;
pub use identify::*;
pub use probe::*;
