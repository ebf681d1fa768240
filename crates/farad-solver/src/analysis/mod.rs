//! Analysis drivers: transient, DC sweep, AC sweep.
//!
//! Each driver owns its result tables, borrows the circuit for the
//! duration of one run, and appends rows strictly in analysis order.
//! Mid-run solver failures are logged through the `log` facade and
//! truncate the tables; only pre-analysis validation returns an error.

pub mod ac_sweep;
pub mod dc_sweep;
pub mod transient;

pub use ac_sweep::{AcSweepAnalysis, AcSweepType};
pub use dc_sweep::DcSweepAnalysis;
pub use transient::TransientAnalysis;

use std::collections::{BTreeMap, HashMap};

use farad_core::mna::SystemLayout;
use farad_core::{Circuit, Element};
use nalgebra::DVector;

/// Result signal name for a node voltage.
pub fn voltage_signal(key: &str) -> String {
    format!("V({key})")
}

/// Result signal name for an element current.
pub fn current_signal(name: &str) -> String {
    format!("I({name})")
}

/// Create the empty signal table for a real analysis: a voltage trace
/// per node (ground included, identically zero) and a current trace per
/// branch-unknown element and per resistor.
pub(crate) fn init_signals(
    circuit: &Circuit,
    layout: &SystemLayout,
) -> BTreeMap<String, Vec<f64>> {
    let mut signals = BTreeMap::new();
    for node in circuit.nodes() {
        signals.insert(voltage_signal(node.id()), Vec::new());
    }
    for name in layout.vsources.keys() {
        signals.insert(current_signal(name), Vec::new());
    }
    for name in layout.inductors.keys() {
        signals.insert(current_signal(name), Vec::new());
    }
    for name in layout.ccvs.keys() {
        signals.insert(current_signal(name), Vec::new());
    }
    for element in circuit.elements() {
        if let Element::Resistor { name, .. } = element {
            signals.insert(current_signal(name), Vec::new());
        }
    }
    signals
}

/// Append one solution's worth of values to every signal and mirror the
/// node voltages onto the circuit for display. Returns the node-voltage
/// map so the transient driver can roll it into the carried state.
pub(crate) fn record_sample(
    signals: &mut BTreeMap<String, Vec<f64>>,
    circuit: &mut Circuit,
    layout: &SystemLayout,
    x: &DVector<f64>,
) -> HashMap<String, f64> {
    let mut voltages = HashMap::new();
    for node in circuit.nodes() {
        let v = if node.is_ground() {
            0.0
        } else {
            layout.node_index(node.id()).map(|i| x[i]).unwrap_or(0.0)
        };
        voltages.insert(node.id().to_string(), v);
    }
    for (key, v) in &voltages {
        if let Some(series) = signals.get_mut(&voltage_signal(key)) {
            series.push(*v);
        }
    }

    for name in layout.vsources.keys() {
        let row = layout.vsource_row(name).expect("vsource in layout");
        if let Some(series) = signals.get_mut(&current_signal(name)) {
            series.push(x[row]);
        }
    }
    for name in layout.inductors.keys() {
        let row = layout.inductor_row(name).expect("inductor in layout");
        if let Some(series) = signals.get_mut(&current_signal(name)) {
            series.push(x[row]);
        }
    }
    for name in layout.ccvs.keys() {
        let row = layout.ccvs_row(name).expect("ccvs in layout");
        if let Some(series) = signals.get_mut(&current_signal(name)) {
            series.push(x[row]);
        }
    }

    for element in circuit.elements() {
        if let Element::Resistor { name, n1, n2, resistance } = element {
            let current = if *resistance != 0.0 {
                (voltages[n1.as_str()] - voltages[n2.as_str()]) / resistance
            } else {
                log::warn!("zero resistance in '{name}', reporting zero current");
                0.0
            };
            if let Some(series) = signals.get_mut(&current_signal(name)) {
                series.push(current);
            }
        }
    }

    for (key, v) in &voltages {
        circuit.set_node_voltage(key, *v);
    }
    voltages
}
