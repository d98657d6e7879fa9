use rand::RngExt;

/// Source of uniform randomness for the animator.
///
/// Every `rand` generator is a source; tests plug in scripted ones to pin
/// down exact trajectories.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform sample in `[lo, hi)`.
    fn between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }

    /// Uniform integer in `lo..=hi`. Always consumes one sample.
    fn count_between(&mut self, lo: usize, hi: usize) -> usize {
        let u = self.unit();
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        lo + ((u * span) as usize).min(hi - lo)
    }
}

impl<R: RngExt> RandomSource for R {
    fn unit(&mut self) -> f64 {
        self.random_range(0.0..1.0)
    }
}
