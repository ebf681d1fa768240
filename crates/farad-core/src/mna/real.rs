//! Real-valued MNA assembly for DC and transient operating points.

use nalgebra::{DMatrix, DVector};

use crate::circuit::Circuit;
use crate::element::Element;

use super::layout::SystemLayout;

/// Conductance floor added to every KCL diagonal. Keeps nodes that are
/// only capacitively coupled (open at DC) from producing a singular
/// system.
pub const GMIN: f64 = 1e-12;

/// Which operating point the assembler builds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssemblyMode {
    /// DC: capacitors open, inductors short, waveforms sampled at t = 0.
    Dc,
    /// Transient step ending at `time`, with backward-Euler companion
    /// models over `step`.
    Transient { time: f64, step: f64 },
}

impl AssemblyMode {
    fn time(&self) -> f64 {
        match self {
            AssemblyMode::Dc => 0.0,
            AssemblyMode::Transient { time, .. } => *time,
        }
    }

    fn step(&self) -> Option<f64> {
        match self {
            AssemblyMode::Transient { step, .. } if *step > 0.0 => Some(*step),
            _ => None,
        }
    }
}

/// Build the dense `(A, b)` system for the circuit's current state.
///
/// Writes hitting the ground row/column are omitted; everything else of
/// a stamp still lands. Reactive elements read the circuit's
/// `previous_*` state for their companion models; the diode linearizes
/// around the previous node voltages.
pub fn assemble(
    circuit: &Circuit,
    layout: &SystemLayout,
    mode: AssemblyMode,
) -> (DMatrix<f64>, DVector<f64>) {
    let n = layout.num_nodes();
    let size = layout.size();
    let mut a = DMatrix::zeros(size, size);
    let mut b = DVector::zeros(size);

    for i in 0..n {
        a[(i, i)] += GMIN;
    }

    let prev_v = |key: &str| -> f64 {
        circuit.previous_node_voltages.get(key).copied().unwrap_or(0.0)
    };

    for element in circuit.elements() {
        match element {
            Element::Resistor { n1, n2, resistance, .. } => {
                if *resistance != 0.0 {
                    let g = 1.0 / resistance;
                    stamp_conductance(&mut a, layout.node_index(n1), layout.node_index(n2), g);
                }
            }
            Element::Capacitor { n1, n2, capacitance, .. } => {
                // Open at DC; backward-Euler companion in transient.
                if let Some(step) = mode.step() {
                    let gc = capacitance / step;
                    let k1 = layout.node_index(n1);
                    let k2 = layout.node_index(n2);
                    stamp_conductance(&mut a, k1, k2, gc);

                    let i_eq = gc * (prev_v(n1) - prev_v(n2));
                    if let Some(i) = k1 {
                        b[i] += i_eq;
                    }
                    if let Some(i) = k2 {
                        b[i] -= i_eq;
                    }
                }
            }
            Element::Inductor { name, n1, n2, inductance } => {
                let row = layout.inductor_row(name).expect("inductor in layout");
                stamp_branch_incidence(&mut a, layout.node_index(n1), layout.node_index(n2), row);

                if let Some(step) = mode.step() {
                    // vL - (L/h) jL = -(L/h) jL_prev
                    let l_over_h = inductance / step;
                    let i_prev = circuit
                        .previous_inductor_currents
                        .get(name)
                        .copied()
                        .unwrap_or(0.0);
                    a[(row, row)] -= l_over_h;
                    b[row] = -l_over_h * i_prev;
                } else {
                    // DC: a short, vL = 0.
                    b[row] = 0.0;
                }
            }
            Element::VoltageSource { name, n1, n2, voltage } => {
                let row = layout.vsource_row(name).expect("vsource in layout");
                stamp_branch_incidence(&mut a, layout.node_index(n1), layout.node_index(n2), row);
                b[row] = *voltage;
            }
            Element::PulseSource { name, n1, n2, wave } => {
                let row = layout.vsource_row(name).expect("vsource in layout");
                stamp_branch_incidence(&mut a, layout.node_index(n1), layout.node_index(n2), row);
                b[row] = wave.voltage_at(mode.time());
            }
            Element::SineSource { name, n1, n2, wave } => {
                let row = layout.vsource_row(name).expect("vsource in layout");
                stamp_branch_incidence(&mut a, layout.node_index(n1), layout.node_index(n2), row);
                b[row] = wave.voltage_at(mode.time());
            }
            Element::CurrentSource { n1, n2, current, .. } => {
                if let Some(i) = layout.node_index(n1) {
                    b[i] -= current;
                }
                if let Some(i) = layout.node_index(n2) {
                    b[i] += current;
                }
            }
            Element::Vcvs { name, n1, n2, cn1, cn2, gain } => {
                let row = layout.vsource_row(name).expect("vsource in layout");
                stamp_branch_incidence(&mut a, layout.node_index(n1), layout.node_index(n2), row);
                // Branch equation: v(n1) - v(n2) - gain * (v(cn1) - v(cn2)) = 0
                if let Some(j) = layout.node_index(cn1) {
                    a[(row, j)] -= gain;
                }
                if let Some(j) = layout.node_index(cn2) {
                    a[(row, j)] += gain;
                }
                b[row] = 0.0;
            }
            Element::Vccs { n1, n2, cn1, cn2, gm, .. } => {
                let k1 = layout.node_index(n1);
                let k2 = layout.node_index(n2);
                let c1 = layout.node_index(cn1);
                let c2 = layout.node_index(cn2);
                // I(n1->n2) = gm * (v(cn1) - v(cn2)); current leaving n1
                // appears positive on the KCL left-hand side.
                if let Some(i) = k1 {
                    if let Some(j) = c1 {
                        a[(i, j)] += gm;
                    }
                    if let Some(j) = c2 {
                        a[(i, j)] -= gm;
                    }
                }
                if let Some(i) = k2 {
                    if let Some(j) = c1 {
                        a[(i, j)] -= gm;
                    }
                    if let Some(j) = c2 {
                        a[(i, j)] += gm;
                    }
                }
            }
            Element::Cccs { n1, n2, control_branch, gain, .. } => {
                let col = layout
                    .branch_column(control_branch)
                    .expect("validated by layout");
                if let Some(i) = layout.node_index(n1) {
                    a[(i, col)] += gain;
                }
                if let Some(i) = layout.node_index(n2) {
                    a[(i, col)] -= gain;
                }
            }
            Element::Ccvs { name, n1, n2, control_branch, transresistance } => {
                let row = layout.ccvs_row(name).expect("ccvs in layout");
                let col = layout
                    .branch_column(control_branch)
                    .expect("validated by layout");
                stamp_branch_incidence(&mut a, layout.node_index(n1), layout.node_index(n2), row);
                // Branch equation: v(n1) - v(n2) - rm * j(branch) = 0
                a[(row, col)] -= transresistance;
                b[row] = 0.0;
            }
            Element::Diode { n1, n2, model, .. } => {
                // Shockley companion linearized around the previous solution.
                let vd_prev = prev_v(n1) - prev_v(n2);
                let n_vt = model.ideality * model.thermal_voltage;
                let exp_term = (vd_prev / n_vt).exp();
                let id_prev = model.saturation_current * (exp_term - 1.0);
                let gd = model.saturation_current / n_vt * exp_term;
                let i_eq = id_prev - gd * vd_prev;

                let k1 = layout.node_index(n1);
                let k2 = layout.node_index(n2);
                stamp_conductance(&mut a, k1, k2, gd);
                if let Some(i) = k1 {
                    b[i] -= i_eq;
                }
                if let Some(i) = k2 {
                    b[i] += i_eq;
                }
            }
            Element::AcSource { .. } | Element::Ground { .. } => {}
        }
    }

    (a, b)
}

/// Conductance stamp with ground writes omitted.
fn stamp_conductance(a: &mut DMatrix<f64>, k1: Option<usize>, k2: Option<usize>, g: f64) {
    if let Some(i) = k1 {
        a[(i, i)] += g;
    }
    if let Some(i) = k2 {
        a[(i, i)] += g;
    }
    if let (Some(i), Some(j)) = (k1, k2) {
        a[(i, j)] -= g;
        a[(j, i)] -= g;
    }
}

/// Incidence entries coupling a branch-current unknown to its terminal
/// nodes: +1 at (k1, row)/(row, k1), -1 at (k2, row)/(row, k2).
fn stamp_branch_incidence(a: &mut DMatrix<f64>, k1: Option<usize>, k2: Option<usize>, row: usize) {
    if let Some(i) = k1 {
        a[(i, row)] += 1.0;
        a[(row, i)] += 1.0;
    }
    if let Some(i) = k2 {
        a[(i, row)] -= 1.0;
        a[(row, i)] -= 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{DiodeModel, Element};

    fn grounded(mut c: Circuit) -> Circuit {
        c.add_element(Element::Ground {
            name: "GND".into(),
            node: "0".into(),
        })
        .unwrap();
        c
    }

    #[test]
    fn test_resistor_stamp() {
        let mut c = Circuit::new();
        c.add_element(Element::Resistor {
            name: "R1".into(),
            n1: "a".into(),
            n2: "b".into(),
            resistance: 2.0,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, _) = assemble(&c, &layout, AssemblyMode::Dc);

        assert!((a[(0, 0)] - (0.5 + GMIN)).abs() < 1e-15);
        assert!((a[(1, 1)] - (0.5 + GMIN)).abs() < 1e-15);
        assert_eq!(a[(0, 1)], -0.5);
        assert_eq!(a[(1, 0)], -0.5);
    }

    #[test]
    fn test_resistor_stamp_to_ground_is_partial() {
        let mut c = Circuit::new();
        c.add_element(Element::Resistor {
            name: "R1".into(),
            n1: "a".into(),
            n2: "0".into(),
            resistance: 4.0,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, _) = assemble(&c, &layout, AssemblyMode::Dc);

        // Only the surviving diagonal entry is written.
        assert_eq!(a.nrows(), 1);
        assert!((a[(0, 0)] - (0.25 + GMIN)).abs() < 1e-15);
    }

    #[test]
    fn test_capacitor_open_at_dc() {
        let mut c = Circuit::new();
        c.add_element(Element::Capacitor {
            name: "C1".into(),
            n1: "a".into(),
            n2: "0".into(),
            capacitance: 1e-6,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, b) = assemble(&c, &layout, AssemblyMode::Dc);

        assert!((a[(0, 0)] - GMIN).abs() < 1e-18);
        assert_eq!(b[0], 0.0);
    }

    #[test]
    fn test_capacitor_companion_in_transient() {
        let mut c = Circuit::new();
        c.add_element(Element::Capacitor {
            name: "C1".into(),
            n1: "a".into(),
            n2: "0".into(),
            capacitance: 1e-6,
        })
        .unwrap();
        let mut c = grounded(c);
        c.previous_node_voltages.insert("a".into(), 2.5);

        let layout = SystemLayout::for_circuit(&c).unwrap();
        let mode = AssemblyMode::Transient { time: 1e-6, step: 1e-6 };
        let (a, b) = assemble(&c, &layout, mode);

        // gC = C/h = 1.0, equivalent source gC * v_prev = 2.5
        assert!((a[(0, 0)] - (1.0 + GMIN)).abs() < 1e-12);
        assert!((b[0] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_voltage_source_rows() {
        let mut c = Circuit::new();
        c.add_element(Element::VoltageSource {
            name: "V1".into(),
            n1: "a".into(),
            n2: "0".into(),
            voltage: 10.0,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, b) = assemble(&c, &layout, AssemblyMode::Dc);

        assert_eq!(a[(0, 1)], 1.0);
        assert_eq!(a[(1, 0)], 1.0);
        assert_eq!(b[1], 10.0);
    }

    #[test]
    fn test_inductor_dc_is_short() {
        let mut c = Circuit::new();
        c.add_element(Element::Inductor {
            name: "L1".into(),
            n1: "a".into(),
            n2: "0".into(),
            inductance: 1e-3,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, b) = assemble(&c, &layout, AssemblyMode::Dc);

        // Branch row pins v(a) = 0, no diagonal term.
        assert_eq!(a[(1, 0)], 1.0);
        assert_eq!(a[(0, 1)], 1.0);
        assert_eq!(a[(1, 1)], 0.0);
        assert_eq!(b[1], 0.0);
    }

    #[test]
    fn test_inductor_transient_branch_equation() {
        let mut c = Circuit::new();
        c.add_element(Element::Inductor {
            name: "L1".into(),
            n1: "a".into(),
            n2: "0".into(),
            inductance: 1e-3,
        })
        .unwrap();
        let mut c = grounded(c);
        c.previous_inductor_currents.insert("L1".into(), 0.02);

        let layout = SystemLayout::for_circuit(&c).unwrap();
        let mode = AssemblyMode::Transient { time: 1e-6, step: 1e-6 };
        let (a, b) = assemble(&c, &layout, mode);

        // L/h = 1000: v - 1000 j = -1000 * 0.02
        assert!((a[(1, 1)] + 1000.0).abs() < 1e-9);
        assert!((b[1] + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_vcvs_stamp() {
        let mut c = Circuit::new();
        c.add_element(Element::Vcvs {
            name: "E1".into(),
            n1: "out".into(),
            n2: "0".into(),
            cn1: "in".into(),
            cn2: "0".into(),
            gain: 2.0,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, b) = assemble(&c, &layout, AssemblyMode::Dc);

        // Nodes alphabetical: in=0, out=1; branch row 2.
        assert_eq!(a[(1, 2)], 1.0);
        assert_eq!(a[(2, 1)], 1.0);
        assert_eq!(a[(2, 0)], -2.0);
        assert_eq!(b[2], 0.0);
    }

    #[test]
    fn test_vccs_stamps_into_matrix() {
        let mut c = Circuit::new();
        c.add_element(Element::Vccs {
            name: "G1".into(),
            n1: "out".into(),
            n2: "0".into(),
            cn1: "in".into(),
            cn2: "0".into(),
            gm: 1e-3,
        })
        .unwrap();
        // Keep "in" a real node.
        c.add_element(Element::Resistor {
            name: "R1".into(),
            n1: "in".into(),
            n2: "0".into(),
            resistance: 1e3,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, b) = assemble(&c, &layout, AssemblyMode::Dc);

        // in=0, out=1: the transconductance lands in A, not b.
        assert!((a[(1, 0)] - 1e-3).abs() < 1e-15);
        assert_eq!(b[1], 0.0);
    }

    #[test]
    fn test_cccs_and_ccvs_reference_control_column() {
        let mut c = Circuit::new();
        c.add_element(Element::VoltageSource {
            name: "V1".into(),
            n1: "a".into(),
            n2: "0".into(),
            voltage: 1.0,
        })
        .unwrap();
        c.add_element(Element::Cccs {
            name: "F1".into(),
            n1: "b".into(),
            n2: "0".into(),
            control_branch: "V1".into(),
            gain: 3.0,
        })
        .unwrap();
        c.add_element(Element::Ccvs {
            name: "H1".into(),
            n1: "c".into(),
            n2: "0".into(),
            control_branch: "V1".into(),
            transresistance: 100.0,
        })
        .unwrap();
        let c = grounded(c);
        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, _) = assemble(&c, &layout, AssemblyMode::Dc);

        // Nodes a=0, b=1, c=2; V1 branch row 3, H1 branch row 4.
        assert_eq!(a[(1, 3)], 3.0);
        assert_eq!(a[(2, 4)], 1.0);
        assert_eq!(a[(4, 2)], 1.0);
        assert_eq!(a[(4, 3)], -100.0);
    }

    #[test]
    fn test_diode_companion() {
        let mut c = Circuit::new();
        c.add_element(Element::Diode {
            name: "D1".into(),
            n1: "a".into(),
            n2: "0".into(),
            model: DiodeModel::new("default"),
        })
        .unwrap();
        let mut c = grounded(c);
        c.previous_node_voltages.insert("a".into(), 0.5);

        let layout = SystemLayout::for_circuit(&c).unwrap();
        let (a, b) = assemble(&c, &layout, AssemblyMode::Dc);

        let n_vt = 0.026;
        let exp_term = (0.5_f64 / n_vt).exp();
        let gd = 1e-12 / n_vt * exp_term;
        let id = 1e-12 * (exp_term - 1.0);
        let i_eq = id - gd * 0.5;

        assert!((a[(0, 0)] - (gd + GMIN)).abs() < gd * 1e-12);
        assert!((b[0] + i_eq).abs() < i_eq.abs() * 1e-12);
    }
}
