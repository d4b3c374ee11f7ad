// Minimal seeded PRNG (no external crates).
//
// Not cryptographically secure. Used only for the WTA layer's tie-breaking
// noise and for reproducible evaluation.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64* (Marsaglia / Vigna family).
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform draw in [0, 1).
    #[inline]
    pub fn next_f32_01(&mut self) -> f32 {
        let x = self.next_u32();
        (x as f32) / (u32::MAX as f32 + 1.0)
    }

    /// Uniform draw in [low - offset, high - offset) with low = 0, high = 1,
    /// i.e. recentered noise for the WTA layer.
    #[inline]
    pub fn noise(&mut self, offset: f32) -> f32 {
        self.next_f32_01() - offset
    }

    #[inline]
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32_01()
    }

    #[inline]
    pub fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as u32;
        let v = self.next_u32() % span;
        low + v as usize
    }
}
