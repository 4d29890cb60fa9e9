use std::f64::consts::FRAC_PI_2;

/// Fade position between player A (0) and player B (1) with linear ramps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossFade {
    from: f64,
    to: f64,
    ramp_start: f64,
    ramp_end: f64,
}

impl CrossFade {
    pub fn new(value: f64) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self {
            from: value,
            to: value,
            ramp_start: 0.0,
            ramp_end: 0.0,
        }
    }

    /// Fade value at audio-clock time `t`
    pub fn value_at(&self, t: f64) -> f64 {
        if t <= self.ramp_start {
            self.from
        } else if t >= self.ramp_end {
            self.to
        } else {
            let ratio = (t - self.ramp_start) / (self.ramp_end - self.ramp_start);
            self.from + (self.to - self.from) * ratio
        }
    }

    /// Ramp linearly from the current value to `value` over `duration` seconds
    pub fn linear_ramp_to(&mut self, value: f64, now: f64, duration: f64) {
        self.from = self.value_at(now);
        self.to = value.clamp(0.0, 1.0);
        self.ramp_start = now;
        self.ramp_end = now + duration.max(0.0);
    }

    /// Equal-power gains of (A, B) at `t`
    pub fn gains_at(&self, t: f64) -> (f64, f64) {
        let angle = self.value_at(t) * FRAC_PI_2;
        (angle.cos(), angle.sin())
    }
}

impl Default for CrossFade {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_ramp() {
        let mut fade = CrossFade::new(0.0);
        fade.linear_ramp_to(1.0, 10.0, 1.0);
        assert_eq!(fade.value_at(9.0), 0.0);
        assert!((fade.value_at(10.25) - 0.25).abs() < 1e-12);
        assert_eq!(fade.value_at(11.5), 1.0);

        // ramp interrupted halfway starts from the current value
        fade.linear_ramp_to(0.0, 10.5, 1.0);
        assert!((fade.value_at(10.5) - 0.5).abs() < 1e-12);
        assert!((fade.value_at(11.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_equal_power_gains() {
        let fade = CrossFade::new(1.0);
        let (a, b) = fade.gains_at(0.0);
        assert!(a.abs() < 1e-12);
        assert!((b - 1.0).abs() < 1e-12);
    }
}
