use super::error::TelemetryError;
use super::source::{SampleSource, SAMPLE_RANGE};

const FIELD_COUNT: usize = 15;
const FIELD_LEN: usize = core::mem::size_of::<u32>();

/// Size of the telemetry blob on the wire
pub const FRAME_LEN: usize = FIELD_COUNT * FIELD_LEN;

/// Encoded record, shared by notifications and read responses
pub type Frame = [u8; FRAME_LEN];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Axes {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Orientation {
    pub pitch: u32,
    pub roll: u32,
    pub yaw: u32,
}

/// Latest sample set of the glove.
///
/// The wire layout is fifteen little-endian `u32`s in declaration order:
///
/// ```text
/// | uptime_s | flex[0..5] | accel x,y,z | gyro x,y,z | pitch, roll, yaw |
/// ```
///
/// Existing clients unpack this layout directly, so field order is fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryRecord {
    /// Device uptime in whole seconds
    pub uptime_s: u32,
    pub flex: [u32; 5],
    pub accel: Axes,
    pub gyro: Axes,
    pub orientation: Orientation,
}

impl TelemetryRecord {
    pub const ZERO: Self = Self {
        uptime_s: 0,
        flex: [0; 5],
        accel: Axes { x: 0, y: 0, z: 0 },
        gyro: Axes { x: 0, y: 0, z: 0 },
        orientation: Orientation {
            pitch: 0,
            roll: 0,
            yaw: 0,
        },
    };

    fn fields(&self) -> [u32; FIELD_COUNT] {
        let [f1, f2, f3, f4, f5] = self.flex;
        [
            self.uptime_s,
            f1,
            f2,
            f3,
            f4,
            f5,
            self.accel.x,
            self.accel.y,
            self.accel.z,
            self.gyro.x,
            self.gyro.y,
            self.gyro.z,
            self.orientation.pitch,
            self.orientation.roll,
            self.orientation.yaw,
        ]
    }

    fn from_fields(fields: [u32; FIELD_COUNT]) -> Self {
        let [uptime_s, f1, f2, f3, f4, f5, ax, ay, az, gx, gy, gz, pitch, roll, yaw] = fields;

        Self {
            uptime_s,
            flex: [f1, f2, f3, f4, f5],
            accel: Axes {
                x: ax,
                y: ay,
                z: az,
            },
            gyro: Axes {
                x: gx,
                y: gy,
                z: gz,
            },
            orientation: Orientation { pitch, roll, yaw },
        }
    }

    /// Encode into the fixed wire layout
    pub fn to_bytes(&self) -> Frame {
        let mut frame = [0u8; FRAME_LEN];

        for (chunk, field) in frame.chunks_exact_mut(FIELD_LEN).zip(self.fields()) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }

        frame
    }

    /// Decode from the fixed wire layout; bytes past the frame are ignored
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TelemetryError> {
        let frame = bytes
            .get(..FRAME_LEN)
            .ok_or(TelemetryError::FrameLength(bytes.len()))?;

        let mut fields = [0u32; FIELD_COUNT];
        for (field, chunk) in fields.iter_mut().zip(frame.chunks_exact(FIELD_LEN)) {
            *field = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        Ok(Self::from_fields(fields))
    }

    /// Overwrite every field: uptime from the clock, the rest from `source`
    /// in wire order.
    pub fn refresh<S: SampleSource>(&mut self, uptime_ms: u64, source: &mut S) {
        let mut fields = [0u32; FIELD_COUNT];

        fields[0] = u32::try_from(uptime_ms / 1000).unwrap_or(u32::MAX);
        for field in &mut fields[1..] {
            *field = source.next_u32(SAMPLE_RANGE);
        }

        *self = Self::from_fields(fields);
    }
}

/// Partial read of an encoded frame.
///
/// Returns at most `max_len` bytes starting at `offset`, clipped to the frame.
/// An offset past the end yields an empty slice.
pub fn read_range(frame: &[u8], offset: usize, max_len: usize) -> &[u8] {
    let start = offset.min(frame.len());
    let end = offset.saturating_add(max_len).min(frame.len());

    &frame[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known_record() -> TelemetryRecord {
        TelemetryRecord {
            uptime_s: 42,
            flex: [1, 2, 3, 4, 5],
            accel: Axes {
                x: 10,
                y: 11,
                z: 12,
            },
            gyro: Axes {
                x: 20,
                y: 21,
                z: 22,
            },
            orientation: Orientation {
                pitch: 30,
                roll: 31,
                yaw: 32,
            },
        }
    }

    struct Counter(u32);

    impl SampleSource for Counter {
        fn next_u32(&mut self, range: u32) -> u32 {
            self.0 += 1;
            self.0 % range
        }
    }

    #[test]
    fn test_frame_layout() {
        let frame = known_record().to_bytes();

        assert_eq!(frame.len(), 60);
        assert_eq!(&frame[0..4], &[42, 0, 0, 0]);
        assert_eq!(&frame[4..8], &[1, 0, 0, 0]);
        assert_eq!(&frame[24..28], &[10, 0, 0, 0]);
        assert_eq!(&frame[36..40], &[20, 0, 0, 0]);
        assert_eq!(&frame[56..60], &[32, 0, 0, 0]);
    }

    #[test]
    fn test_little_endian_fields() {
        let record = TelemetryRecord {
            uptime_s: 0x0403_0201,
            ..TelemetryRecord::ZERO
        };

        assert_eq!(&record.to_bytes()[..4], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_decode_known_record() {
        let frame = known_record().to_bytes();

        assert_eq!(TelemetryRecord::from_bytes(&frame), Ok(known_record()));
    }

    #[test]
    fn test_decode_short_frame() {
        let frame = known_record().to_bytes();

        assert_eq!(
            TelemetryRecord::from_bytes(&frame[..10]),
            Err(TelemetryError::FrameLength(10))
        );
        assert_eq!(
            TelemetryRecord::from_bytes(&[]),
            Err(TelemetryError::FrameLength(0))
        );
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut buffer = [0xffu8; 64];
        buffer[..FRAME_LEN].copy_from_slice(&known_record().to_bytes());

        assert_eq!(TelemetryRecord::from_bytes(&buffer), Ok(known_record()));
    }

    #[test]
    fn test_refresh_overwrites_every_field() {
        let mut record = known_record();
        record.refresh(7_999, &mut Counter(100));

        assert_eq!(record.uptime_s, 7);
        assert_eq!(record.flex, [101, 102, 103, 104, 105]);
        assert_eq!(
            record.accel,
            Axes {
                x: 106,
                y: 107,
                z: 108
            }
        );
        assert_eq!(
            record.gyro,
            Axes {
                x: 109,
                y: 110,
                z: 111
            }
        );
        assert_eq!(
            record.orientation,
            Orientation {
                pitch: 112,
                roll: 113,
                yaw: 114
            }
        );
    }

    #[test]
    fn test_refresh_saturates_uptime() {
        let mut record = TelemetryRecord::ZERO;
        record.refresh(u64::MAX, &mut Counter(0));

        assert_eq!(record.uptime_s, u32::MAX);
    }

    #[test]
    fn test_read_range() {
        let frame = known_record().to_bytes();

        assert_eq!(read_range(&frame, 0, 100), &frame[..]);
        assert_eq!(read_range(&frame, 4, 4), &frame[4..8]);
        assert_eq!(read_range(&frame, 50, 22), &frame[50..60]);
        assert_eq!(read_range(&frame, 59, 1), &[0]);
        assert!(read_range(&frame, 60, 10).is_empty());
        assert!(read_range(&frame, 200, 10).is_empty());
        assert!(read_range(&frame, 10, 0).is_empty());
        assert!(read_range(&frame, usize::MAX, usize::MAX).is_empty());
    }
}
