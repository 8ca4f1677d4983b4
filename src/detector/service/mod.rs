mod pipeline;
mod snapshot;

pub use pipeline::{Detector, ReadingOutcome};
pub use snapshot::DetectorSnapshot;
