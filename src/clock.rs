//! Animation clock deriving a rotation angle from frame timestamps.

/// Divisor applied to timestamp deltas: elapsed time advances the rotation
/// angle by one unit per 500 time units. The surrounding application picks
/// the time unit (the browser hands out milliseconds, a native loop might
/// hand out whatever its frame timer produces) and must keep it consistent
/// for a session.
pub const ROTATION_RATE_DIVISOR: f32 = 500.0;

/// Converts an absolute timestamp stream into a monotonically accumulated
/// rotation angle.
///
/// The clock has two states. Before the first [`tick`](FrameClock::tick) it
/// has no reference point, so the first call only records its timestamp and
/// reports zero rotation; using the delta from an arbitrary epoch instead
/// would make the mesh jump on the very first frame. Every later call
/// advances the accumulator by `delta / 500`.
///
/// Timestamps are trusted as-is: a decreasing timestamp decreases the
/// accumulator by the same formula, with no clamping.
///
/// ```
/// use spinmesh::FrameClock;
///
/// let mut clock = FrameClock::new();
/// assert_eq!(clock.tick(1000.0), 0.0);
/// assert_eq!(clock.tick(1250.0), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_timestamp: Option<f32>,
    rotation: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame timestamp and get back the accumulated rotation angle.
    pub fn tick(&mut self, timestamp: f32) -> f32 {
        if let Some(last) = self.last_timestamp {
            self.rotation += (timestamp - last) / ROTATION_RATE_DIVISOR;
        }
        self.last_timestamp = Some(timestamp);
        self.rotation
    }

    /// The accumulated rotation angle without advancing the clock.
    pub fn angle(&self) -> f32 {
        self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_zero_regardless_of_timestamp() {
        assert_eq!(FrameClock::new().tick(0.0), 0.0);
        assert_eq!(FrameClock::new().tick(123456.0), 0.0);
        assert_eq!(FrameClock::new().tick(-50.0), 0.0);
    }

    #[test]
    fn second_tick_scales_delta_by_rate_divisor() {
        let mut clock = FrameClock::new();
        clock.tick(100.0);
        assert_eq!(clock.tick(600.0), 1.0);
        assert_eq!(clock.tick(850.0), 1.5);
    }

    #[test]
    fn decreasing_timestamps_rewind_the_accumulator() {
        let mut clock = FrameClock::new();
        clock.tick(1000.0);
        clock.tick(2000.0);
        assert_eq!(clock.angle(), 2.0);
        // No clamping: the source stream is trusted.
        assert_eq!(clock.tick(500.0), -1.0);
    }

    #[test]
    fn angle_does_not_advance_the_clock() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(250.0);
        assert_eq!(clock.angle(), 0.5);
        assert_eq!(clock.angle(), 0.5);
    }
}
