/// Time on the audio clock, in seconds.
pub type Time = f64;

/// A monotonically increasing time source shared with the renderer.
///
/// All ramp and release timestamps are absolute values on this clock.
pub trait AudioClock {
    fn now(&self) -> Time;
}
