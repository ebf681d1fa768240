//! Analytic time-dependent source waveforms.

use std::f64::consts::PI;

/// PULSE(V1 V2 Td Tr Tf Pw Per) waveform parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseWave {
    /// Initial (low) level (V).
    pub v1: f64,
    /// Pulsed (high) level (V).
    pub v2: f64,
    /// Delay before the first edge (s).
    pub td: f64,
    /// Rise time (s).
    pub tr: f64,
    /// Fall time (s).
    pub tf: f64,
    /// Pulse width at the high level (s).
    pub pw: f64,
    /// Period (s).
    pub per: f64,
}

impl PulseWave {
    /// Evaluate the pulse at time `t`.
    ///
    /// Before the delay the output sits at V1; afterwards the position
    /// within the period selects rise ramp, high level, fall ramp, or
    /// low level.
    pub fn voltage_at(&self, t: f64) -> f64 {
        if t < self.td {
            return self.v1;
        }
        let tau = (t - self.td) % self.per;
        if tau < self.tr {
            self.v1 + (self.v2 - self.v1) * (tau / self.tr)
        } else if tau < self.tr + self.pw {
            self.v2
        } else if tau < self.tr + self.pw + self.tf {
            let t_fall = tau - self.tr - self.pw;
            self.v2 + (self.v1 - self.v2) * (t_fall / self.tf)
        } else {
            self.v1
        }
    }
}

/// SIN(Voff Vamp f) waveform parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineWave {
    /// DC offset (V).
    pub offset: f64,
    /// Amplitude (V).
    pub amplitude: f64,
    /// Frequency (Hz).
    pub frequency: f64,
}

impl SineWave {
    /// Evaluate the sinusoid at time `t`. A non-positive frequency
    /// degenerates to the offset alone.
    pub fn voltage_at(&self, t: f64) -> f64 {
        if self.frequency <= 0.0 {
            return self.offset;
        }
        self.offset + self.amplitude * (2.0 * PI * self.frequency * t).sin()
    }
}
