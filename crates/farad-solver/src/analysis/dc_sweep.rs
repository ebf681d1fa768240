//! DC sweep of an independent source.

use std::collections::BTreeMap;

use farad_core::mna::{AssemblyMode, SystemLayout, assemble};
use farad_core::{Circuit, Error, Result};

use crate::linear::LinearSolver;

use super::{init_signals, record_sample};

/// DC sweep driver: steps an independent voltage or current source
/// through a range, solving a DC operating point per value.
///
/// The source is mutated in place and keeps the last applied value when
/// the sweep ends; callers wanting restoration must snapshot first.
#[derive(Debug)]
pub struct DcSweepAnalysis {
    source_name: String,
    start: f64,
    stop: f64,
    increment: f64,
    /// Applied source values, one per row.
    pub sweep_values: Vec<f64>,
    /// Signal name -> value sequence, same length as `sweep_values`.
    pub signals: BTreeMap<String, Vec<f64>>,
}

impl DcSweepAnalysis {
    /// Configure a sweep. The increment must be nonzero and point from
    /// `start` toward `stop`.
    pub fn new(source_name: impl Into<String>, start: f64, stop: f64, increment: f64) -> Result<Self> {
        if increment == 0.0
            || (start < stop && increment < 0.0)
            || (start > stop && increment > 0.0)
        {
            return Err(Error::InvalidParameter(format!(
                "invalid sweep increment {increment} for range {start}..{stop}"
            )));
        }
        Ok(Self {
            source_name: source_name.into(),
            start,
            stop,
            increment,
            sweep_values: Vec::new(),
            signals: BTreeMap::new(),
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Run the sweep. A solver failure at some value is logged and halts
    /// the sweep, preserving the rows recorded so far.
    pub fn run(&mut self, circuit: &mut Circuit, solver: &dyn LinearSolver) -> Result<()> {
        if !circuit.has_ground() {
            return Err(Error::MissingGround);
        }
        if !circuit.is_connected() {
            return Err(Error::Disconnected);
        }
        let layout = SystemLayout::for_circuit(circuit)?;

        match circuit.element(&self.source_name) {
            None => return Err(Error::NotFound(self.source_name.clone())),
            Some(element) if !element.is_swept_source() => {
                return Err(Error::InvalidParameter(format!(
                    "'{}' is not a sweepable source",
                    self.source_name
                )));
            }
            Some(_) => {}
        }

        self.sweep_values.clear();
        self.signals = init_signals(circuit, &layout);

        let mut value = self.start;
        while (self.start < self.stop && value <= self.stop)
            || (self.start > self.stop && value >= self.stop)
        {
            circuit
                .element_mut(&self.source_name)
                .expect("checked above")
                .set_source_value(value);

            let (a, b) = assemble(circuit, &layout, AssemblyMode::Dc);
            match solver.solve(&a, &b) {
                Ok(x) => {
                    self.sweep_values.push(value);
                    record_sample(&mut self.signals, circuit, &layout, &x);
                }
                Err(e) => {
                    log::warn!("dc sweep: solver failed at {}={value}: {e}", self.source_name);
                    break;
                }
            }
            value += self.increment;
        }
        Ok(())
    }
}
