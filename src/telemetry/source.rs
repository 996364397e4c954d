/// Upper bound (exclusive) of every stub sensor reading
pub const SAMPLE_RANGE: u32 = 10_000;

/// Provider of fresh sensor values, one call per telemetry field.
///
/// Sampling is infallible at this layer. A sensor driver that can fault must
/// hand back its last good value instead of stalling the tick loop.
pub trait SampleSource {
    /// Next reading in `[0, range)`
    fn next_u32(&mut self, range: u32) -> u32;
}

/// Stub source drawing every reading from a raw 32-bit generator.
///
/// On target the generator is the hardware RNG; tests plug in a counter.
pub struct RandomSource<F> {
    generator: F,
}

impl<F: FnMut() -> u32> RandomSource<F> {
    pub fn new(generator: F) -> Self {
        Self { generator }
    }
}

impl<F: FnMut() -> u32> SampleSource for RandomSource<F> {
    fn next_u32(&mut self, range: u32) -> u32 {
        // Widening multiply maps [0, 2^32) onto [0, range) without modulo bias
        (((self.generator)() as u64 * range as u64) >> 32) as u32
    }
}
