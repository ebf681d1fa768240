//! Small-signal AC frequency sweep.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use farad_core::mna::{AcLayout, assemble_ac};
use farad_core::{Circuit, Error, Result};
use nalgebra::DVector;
use num_complex::Complex;

use crate::complex::solve_complex;

use super::voltage_signal;

/// Frequency grid spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcSweepType {
    /// Linear spacing from start to stop.
    Lin,
    /// Logarithmic spacing: f_i = f_a * r^i with r = (f_b/f_a)^(1/(N-1)).
    Dec,
}

/// AC sweep driver: solves the complex MNA system at each grid
/// frequency with unit excitation at the designated source.
#[derive(Debug)]
pub struct AcSweepAnalysis {
    source_name: String,
    fstart: f64,
    fstop: f64,
    num_points: usize,
    sweep_type: AcSweepType,
    /// Frequencies actually solved (Hz).
    pub frequency_points: Vec<f64>,
    /// Node signal name -> complex voltage sequence, same length as the
    /// frequency axis.
    pub signals: BTreeMap<String, Vec<Complex<f64>>>,
}

impl AcSweepAnalysis {
    /// Configure a sweep. At least two points are required (the grid
    /// formulas divide by N-1), and a DEC sweep needs positive start
    /// and stop frequencies for its ratio.
    pub fn new(
        source_name: impl Into<String>,
        fstart: f64,
        fstop: f64,
        num_points: usize,
        sweep_type: AcSweepType,
    ) -> Result<Self> {
        if num_points < 2 {
            return Err(Error::InvalidParameter(format!(
                "AC sweep needs at least 2 points, got {num_points}"
            )));
        }
        if sweep_type == AcSweepType::Dec && (fstart <= 0.0 || fstop <= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "DEC sweep needs positive frequencies, got {fstart}..{fstop}"
            )));
        }
        Ok(Self {
            source_name: source_name.into(),
            fstart,
            fstop,
            num_points,
            sweep_type,
            frequency_points: Vec::new(),
            signals: BTreeMap::new(),
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Run the sweep. A solver failure at some frequency is logged and
    /// aborts the sweep, preserving the points accumulated so far.
    pub fn run(&mut self, circuit: &Circuit) -> Result<()> {
        if !circuit.has_ground() {
            return Err(Error::MissingGround);
        }
        if !circuit.is_connected() {
            return Err(Error::Disconnected);
        }
        let layout = AcLayout::for_circuit(circuit);
        let Some(excitation_row) = layout.source_row(&self.source_name) else {
            return Err(Error::NotFound(self.source_name.clone()));
        };

        self.frequency_points.clear();
        self.signals = layout
            .nodes
            .keys()
            .map(|key| (voltage_signal(key), Vec::new()))
            .collect();

        let n = self.num_points;
        for i in 0..n {
            let freq = match self.sweep_type {
                AcSweepType::Dec => {
                    let ratio = (self.fstop / self.fstart).powf(1.0 / (n as f64 - 1.0));
                    self.fstart * ratio.powi(i as i32)
                }
                AcSweepType::Lin => {
                    self.fstart + i as f64 * (self.fstop - self.fstart) / (n as f64 - 1.0)
                }
            };
            let omega = 2.0 * PI * freq;

            let (a, b) = assemble_ac(circuit, &layout, omega);
            let mut b: DVector<Complex<f64>> = b;
            b[excitation_row] = Complex::new(1.0, 0.0);

            match solve_complex(&a, &b) {
                Ok(x) => {
                    self.frequency_points.push(freq);
                    for (key, &idx) in &layout.nodes {
                        if let Some(series) = self.signals.get_mut(&voltage_signal(key)) {
                            series.push(x[idx]);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("ac sweep: solver failed at {freq} Hz: {e}");
                    break;
                }
            }
        }
        Ok(())
    }
}
