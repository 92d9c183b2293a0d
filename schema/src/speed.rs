use std::num::NonZeroU8;
use std::time::Duration;

/// Allows a simulation to run in fast-forward or slow-motion instead of real-time
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speed {
    #[default]
    RealTime,
    /// Speed up the simulation by the provided multiplier (e.g. `2` gives double speed)
    FastForward(NonZeroU8),
    /// Slow down the simulation by the provided multiplier (e.g. `2` gives half speed)
    SlowMotion(NonZeroU8),
}

impl Speed {
    pub fn fast_forward(rate: u8) -> Option<Self> {
        NonZeroU8::new(rate).map(Self::FastForward)
    }

    pub fn slow_motion(rate: u8) -> Option<Self> {
        NonZeroU8::new(rate).map(Self::SlowMotion)
    }

    /// Scales a real-time wait, e.g. a simulated provider delay, to this speed
    pub fn adjust_duration(&self, duration: Duration) -> Duration {
        match self {
            Self::RealTime => duration,
            Self::FastForward(x) => duration / x.get() as u32,
            Self::SlowMotion(x) => duration * x.get() as u32,
        }
    }

    /// Converts real time elapsed into simulated time elapsed
    pub fn scale_elapsed(&self, elapsed: Duration) -> Duration {
        match self {
            Self::RealTime => elapsed,
            Self::FastForward(x) => elapsed * x.get() as u32,
            Self::SlowMotion(x) => elapsed / x.get() as u32,
        }
    }

    /// Positive factors fast-forward, negative factors slow down, zero is real-time.
    /// Factors beyond the range of a `u8` are clamped.
    pub fn from_i32(n: i32) -> Self {
        let rate = |n: i32| NonZeroU8::new(n.unsigned_abs().min(u8::MAX as u32) as u8);
        match n {
            0 => Self::RealTime,
            n if n > 0 => rate(n).map_or(Self::RealTime, Self::FastForward),
            n => rate(n).map_or(Self::RealTime, Self::SlowMotion),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scaling() {
        let second = Duration::from_secs(1);
        let double = Speed::fast_forward(2).expect("speed");
        let half = Speed::slow_motion(2).expect("speed");

        assert_eq!(double.scale_elapsed(second), Duration::from_secs(2));
        assert_eq!(double.adjust_duration(second), Duration::from_millis(500));
        assert_eq!(half.scale_elapsed(second), Duration::from_millis(500));
        assert_eq!(half.adjust_duration(second), Duration::from_secs(2));
        assert_eq!(Speed::RealTime.scale_elapsed(second), second);
    }

    #[test]
    fn test_from_i32() {
        assert_eq!(Speed::from_i32(0), Speed::RealTime);
        assert_eq!(Speed::from_i32(10), Speed::fast_forward(10).expect("speed"));
        assert_eq!(Speed::from_i32(-4), Speed::slow_motion(4).expect("speed"));
        assert_eq!(Speed::from_i32(1000), Speed::fast_forward(255).expect("speed"));
        assert_eq!(Speed::from_i32(-1000), Speed::slow_motion(255).expect("speed"));
    }
}
