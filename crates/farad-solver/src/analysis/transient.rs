//! Fixed-step backward-Euler transient analysis.

use std::collections::{BTreeMap, HashMap};

use farad_core::mna::{AssemblyMode, SystemLayout, assemble};
use farad_core::{Circuit, Error, Result};
use nalgebra::DVector;

use crate::linear::LinearSolver;

use super::{init_signals, record_sample};

/// Iteration cap for the DC operating point that seeds the march.
const MAX_DC_ITERATIONS: usize = 100;
/// Node-voltage delta below which the operating point has converged.
const DC_TOLERANCE: f64 = 1e-6;

/// Transient analysis driver.
///
/// Marches `t = 0, Δt, 2Δt, ...` up to `tstop` inclusive, assembling a
/// backward-Euler system at each step. The initial condition is either a
/// DC operating point (iterated because diodes relinearize around the
/// previous solution) or, with UIC, all zeros. The carried `previous_*`
/// circuit state is rewritten after every recorded sample; that is the
/// only circuit mutation on the analysis path.
#[derive(Debug)]
pub struct TransientAnalysis {
    tstep: f64,
    tstop: f64,
    use_uic: bool,
    /// Time axis, one entry per recorded sample.
    pub time_points: Vec<f64>,
    /// Signal name -> value sequence, every sequence the same length as
    /// the time axis. `V(<node>)` for every node (ground identically
    /// zero), `I(<element>)` for sources with branch unknowns,
    /// inductors, and resistors.
    pub signals: BTreeMap<String, Vec<f64>>,
}

impl TransientAnalysis {
    /// Configure a transient run. Fails with `InvalidParameter` for a
    /// non-positive step or negative stop time.
    pub fn new(tstep: f64, tstop: f64, use_uic: bool) -> Result<Self> {
        if tstep <= 0.0 || tstop < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "invalid transient parameters: tstep={tstep}, tstop={tstop}"
            )));
        }
        Ok(Self {
            tstep,
            tstop,
            use_uic,
            time_points: Vec::new(),
            signals: BTreeMap::new(),
        })
    }

    pub fn tstep(&self) -> f64 {
        self.tstep
    }

    pub fn tstop(&self) -> f64 {
        self.tstop
    }

    /// Run the analysis, filling the result tables.
    ///
    /// A solver failure during the march is logged and terminates the
    /// march; everything recorded up to that point is preserved.
    pub fn run(&mut self, circuit: &mut Circuit, solver: &dyn LinearSolver) -> Result<()> {
        if !circuit.has_ground() {
            return Err(Error::MissingGround);
        }
        if !circuit.is_connected() {
            return Err(Error::Disconnected);
        }
        let layout = SystemLayout::for_circuit(circuit)?;

        self.time_points.clear();
        self.signals = init_signals(circuit, &layout);

        let zero_voltages: HashMap<String, f64> = circuit
            .nodes()
            .map(|n| (n.id().to_string(), 0.0))
            .collect();
        circuit.update_previous_node_voltages(zero_voltages.clone());
        circuit.update_previous_inductor_currents(HashMap::new());

        let mut x = DVector::zeros(layout.size());

        if self.use_uic {
            log::info!("transient: UIC, starting from zero initial conditions");
        } else {
            x = self.dc_operating_point(circuit, solver, &layout, &zero_voltages);
        }

        let slack = self.tstep / 2.0 + 1e-12;
        let mut t = 0.0;
        while t <= self.tstop + slack {
            if t > 0.0 {
                let mode = AssemblyMode::Transient { time: t, step: self.tstep };
                let (a, b) = assemble(circuit, &layout, mode);
                match solver.solve(&a, &b) {
                    Ok(solution) => x = solution,
                    Err(e) => {
                        log::warn!("transient: solver failed at t={t:.6e} s: {e}");
                        break;
                    }
                }
            }
            self.time_points.push(t);
            let voltages = record_sample(&mut self.signals, circuit, &layout, &x);

            let inductor_currents: HashMap<String, f64> = layout
                .inductors
                .keys()
                .map(|name| {
                    let row = layout.inductor_row(name).expect("inductor in layout");
                    (name.clone(), x[row])
                })
                .collect();
            circuit.update_previous_node_voltages(voltages);
            circuit.update_previous_inductor_currents(inductor_currents);

            t += self.tstep;
        }

        // Downstream consumers expect at least one row to render.
        if self.time_points.is_empty() {
            self.time_points.push(0.0);
            for series in self.signals.values_mut() {
                series.push(0.0);
            }
        }
        Ok(())
    }

    /// Iterate a DC operating point: assemble in DC mode, solve, and
    /// relinearize until the largest node-voltage delta drops below
    /// tolerance. Falls back to zero state when the solve fails, and
    /// proceeds with the last iterate when the cap is hit.
    fn dc_operating_point(
        &self,
        circuit: &mut Circuit,
        solver: &dyn LinearSolver,
        layout: &SystemLayout,
        zero_voltages: &HashMap<String, f64>,
    ) -> DVector<f64> {
        let mut x = DVector::zeros(layout.size());
        let mut converged = false;
        for _ in 0..MAX_DC_ITERATIONS {
            let (a, b) = assemble(circuit, layout, AssemblyMode::Dc);
            match solver.solve(&a, &b) {
                Ok(solution) => {
                    let mut max_delta = 0.0_f64;
                    let mut voltages = HashMap::with_capacity(layout.num_nodes() + 1);
                    for (key, &idx) in &layout.nodes {
                        let old = circuit
                            .previous_node_voltages
                            .get(key)
                            .copied()
                            .unwrap_or(0.0);
                        let new = solution[idx];
                        max_delta = max_delta.max((new - old).abs());
                        voltages.insert(key.clone(), new);
                    }
                    if let Some(ground) = circuit.ground_node_id() {
                        voltages.insert(ground.to_string(), 0.0);
                    }
                    circuit.update_previous_node_voltages(voltages);
                    x = solution;
                    if max_delta < DC_TOLERANCE {
                        converged = true;
                        break;
                    }
                }
                Err(e) => {
                    log::warn!(
                        "transient: DC operating point failed ({e}); starting from zero initial conditions"
                    );
                    circuit.update_previous_node_voltages(zero_voltages.clone());
                    return DVector::zeros(layout.size());
                }
            }
        }
        if !converged {
            log::warn!(
                "transient: DC operating point did not converge in {MAX_DC_ITERATIONS} iterations; proceeding with last iterate"
            );
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::GaussianElimination;
    use farad_core::Element;

    fn rc_circuit() -> Circuit {
        let mut c = Circuit::new();
        c.add_element(Element::VoltageSource {
            name: "V1".into(),
            n1: "N1".into(),
            n2: "0".into(),
            voltage: 5.0,
        })
        .unwrap();
        c.add_element(Element::Resistor {
            name: "R1".into(),
            n1: "N1".into(),
            n2: "N2".into(),
            resistance: 1e3,
        })
        .unwrap();
        c.add_element(Element::Capacitor {
            name: "C1".into(),
            n1: "N2".into(),
            n2: "0".into(),
            capacitance: 1e-6,
        })
        .unwrap();
        c.add_element(Element::Ground {
            name: "GND".into(),
            node: "0".into(),
        })
        .unwrap();
        c
    }

    #[test]
    fn test_parameter_validation() {
        assert!(matches!(
            TransientAnalysis::new(0.0, 1e-3, false),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            TransientAnalysis::new(1e-6, -1.0, false),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_missing_ground_rejected() {
        let mut c = Circuit::new();
        c.add_element(Element::Resistor {
            name: "R1".into(),
            n1: "a".into(),
            n2: "b".into(),
            resistance: 1.0,
        })
        .unwrap();
        let mut tran = TransientAnalysis::new(1e-6, 1e-3, true).unwrap();
        assert!(matches!(
            tran.run(&mut c, &GaussianElimination),
            Err(Error::MissingGround)
        ));
    }

    #[test]
    fn test_disconnected_rejected() {
        let mut c = rc_circuit();
        c.add_element(Element::Resistor {
            name: "R9".into(),
            n1: "x".into(),
            n2: "y".into(),
            resistance: 1.0,
        })
        .unwrap();
        let mut tran = TransientAnalysis::new(1e-6, 1e-3, true).unwrap();
        assert!(matches!(
            tran.run(&mut c, &GaussianElimination),
            Err(Error::Disconnected)
        ));
    }

    #[test]
    fn test_table_shape_and_ground_trace() {
        let mut c = rc_circuit();
        let mut tran = TransientAnalysis::new(1e-5, 1e-4, true).unwrap();
        tran.run(&mut c, &GaussianElimination).unwrap();

        // 0..=100us in 10us steps
        assert_eq!(tran.time_points.len(), 11);
        for (name, series) in &tran.signals {
            assert_eq!(series.len(), 11, "signal {name} length mismatch");
        }
        assert!(tran.signals.contains_key("V(N1)"));
        assert!(tran.signals.contains_key("V(N2)"));
        assert!(tran.signals.contains_key("I(V1)"));
        assert!(tran.signals.contains_key("I(R1)"));
        assert!(tran.signals["V(0)"].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_uic_starts_from_zero() {
        let mut c = rc_circuit();
        let mut tran = TransientAnalysis::new(1e-5, 1e-3, true).unwrap();
        tran.run(&mut c, &GaussianElimination).unwrap();

        assert_eq!(tran.signals["V(N2)"][0], 0.0);
        // Capacitor charges toward the source.
        let last = *tran.signals["V(N2)"].last().unwrap();
        assert!(last > 2.0, "V(N2) should charge, got {last}");
    }

    #[test]
    fn test_dc_operating_point_seeds_march() {
        let mut c = rc_circuit();
        let mut tran = TransientAnalysis::new(1e-5, 1e-4, false).unwrap();
        tran.run(&mut c, &GaussianElimination).unwrap();

        // At the operating point the capacitor is already charged.
        assert!((tran.signals["V(N2)"][0] - 5.0).abs() < 1e-3);
        // And it stays there through the march.
        let last = *tran.signals["V(N2)"].last().unwrap();
        assert!((last - 5.0).abs() < 1e-3);
    }
}
