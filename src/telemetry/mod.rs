mod error;
pub mod record;
pub mod source;

pub use error::TelemetryError;
pub use record::{read_range, Axes, Frame, Orientation, TelemetryRecord, FRAME_LEN};
pub use source::{RandomSource, SampleSource, SAMPLE_RANGE};
