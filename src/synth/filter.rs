use serde::{Deserialize, Serialize};

use crate::synth::prelude::{FRAC_1_SQRT_2, PI};

/// Settings of the shared output filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Cutoff in Hz.
    pub frequency: f32,
    #[serde(rename = "Q")]
    pub q: f32,
    pub bypassed: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            frequency: 800.0,
            q: 1.2,
            bypassed: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LowPassBiquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl LowPassBiquad {
    pub fn new(cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self::default();
        filter.configure(cutoff, q, sample_rate);
        filter
    }

    /// Recompute coefficients, keeping the signal history.
    pub fn configure(&mut self, cutoff: f32, q: f32, sample_rate: f32) {
        let sample_rate = sample_rate.max(1.0);
        // Keep the cutoff below Nyquist and Q away from zero
        let cutoff = cutoff.max(1.0).min(sample_rate * 0.49);
        let q = if q.is_finite() && q > 0.0 {
            q.max(0.1)
        } else {
            FRAC_1_SQRT_2
        };

        // RBJ Audio EQ Cookbook low-pass
        let omega = 2.0 * PI * cutoff / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;

        self.b0 = (1.0 - cos_omega) / 2.0 / a0;
        self.b1 = (1.0 - cos_omega) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos_omega / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    /// Direct Form I: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc_and_settles() {
        let mut filter = LowPassBiquad::new(800.0, FRAC_1_SQRT_2, 48_000.0);
        let mut out = 0.0;
        for _ in 0..4800 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-2);
    }

    #[test]
    fn attenuates_nyquist() {
        let mut filter = LowPassBiquad::new(500.0, 1.2, 48_000.0);
        let mut peak: f32 = 0.0;
        for i in 0..4800 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            let out = filter.process(input);
            if i > 2400 {
                peak = peak.max(out.abs());
            }
        }
        assert!(peak < 0.01, "peak {}", peak);
    }

    #[test]
    fn settings_use_browser_field_names() {
        let settings: FilterSettings =
            serde_json::from_str(r#"{"frequency": 1200, "Q": 3.5}"#).unwrap();
        assert_eq!(settings.frequency, 1200.0);
        assert_eq!(settings.q, 3.5);
        assert!(!settings.bypassed);
    }
}
