use super::clock::Time;

/*
Parameter automation
====================

An `AutomationParam` is a continuous control (gain, frequency, detune)
whose value is described by a timeline of absolute-time events rather
than by a single number:

  SetValue(t, v)    the value jumps to `v` at time `t`
  LinearRamp(t, v)  the value moves in a straight line from the previous
                    event's value to `v`, arriving exactly at time `t`

    value
      1.0 ┐        R(t1,1.0)
          │       ╱ ╲
          │      ╱   ╲ R(t2,0.7) ─────────  (holds after the last event)
          │     ╱
      0.0 └──S(t0,0)──────────────────────→ time

Scheduling never blocks: callers record future events and the renderer
samples `value_at(t)` for every frame. `cancel_scheduled_values(t)`
drops every event at or after `t`, so re-triggering a control must first
sample the in-flight value, cancel, then pin that value with a SetValue
before laying down new ramps.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
enum AutomationEvent {
    SetValue { time: Time, value: f32 },
    LinearRamp { time: Time, value: f32 },
}

impl AutomationEvent {
    fn time(&self) -> Time {
        match *self {
            AutomationEvent::SetValue { time, .. } | AutomationEvent::LinearRamp { time, .. } => {
                time
            }
        }
    }

    fn value(&self) -> f32 {
        match *self {
            AutomationEvent::SetValue { value, .. } | AutomationEvent::LinearRamp { value, .. } => {
                value
            }
        }
    }
}

/// A timeline of scheduled values for one audio-rate parameter.
#[derive(Debug, Clone)]
pub struct AutomationParam {
    default_value: f32,
    events: Vec<AutomationEvent>,
}

impl AutomationParam {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::new(),
        }
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f32, time: Time) {
        self.insert(AutomationEvent::SetValue { time, value });
    }

    /// Ramp linearly from the previous event so `value` is reached at `time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: Time) {
        self.insert(AutomationEvent::LinearRamp { time, value });
    }

    /// Remove every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: Time) {
        let keep = self.events.partition_point(|e| e.time() < time);
        self.events.truncate(keep);
    }

    /// The parameter's value at `time`.
    pub fn value_at(&self, time: Time) -> f32 {
        // events[..next] are at or before `time`
        let next = self.events.partition_point(|e| e.time() <= time);
        let Some(previous) = next.checked_sub(1).map(|i| self.events[i]) else {
            return self.default_value;
        };

        match self.events.get(next) {
            Some(&AutomationEvent::LinearRamp {
                time: end_time,
                value: end_value,
            }) => {
                let span = end_time - previous.time();
                if span <= 0.0 {
                    return end_value;
                }
                let progress = ((time - previous.time()) / span) as f32;
                previous.value() + (end_value - previous.value()) * progress
            }
            _ => previous.value(),
        }
    }

    /// Forget events that can no longer influence values at or after `time`.
    ///
    /// The last event at or before `time` is kept as the anchor for any ramp
    /// that is still in flight.
    pub fn prune_before(&mut self, time: Time) {
        let next = self.events.partition_point(|e| e.time() <= time);
        if next > 1 {
            self.events.drain(..next - 1);
        }
    }

    /// Number of events currently on the timeline.
    pub fn scheduled_len(&self) -> usize {
        self.events.len()
    }

    fn insert(&mut self, event: AutomationEvent) {
        // Events sharing a timestamp keep insertion order.
        let index = self.events.partition_point(|e| e.time() <= event.time());

        // A jump replacing a jump at the same instant overwrites it, so
        // repeated updates without rendering do not grow the timeline.
        if let (AutomationEvent::SetValue { time, .. }, Some(previous)) =
            (event, index.checked_sub(1).map(|i| &mut self.events[i]))
        {
            if matches!(*previous, AutomationEvent::SetValue { time: t, .. } if t == time) {
                *previous = event;
                return;
            }
        }
        self.events.insert(index, event);
    }
}

impl Default for AutomationParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
