//! Circuit element variants.
//!
//! Elements are a tagged enum rather than a trait-object hierarchy: the
//! set of device kinds is closed, each variant is a small value type, and
//! the assembler matches on the tag when stamping. Elements reference
//! nodes and controlling branches by *name*; the circuit owns the actual
//! node objects.

use crate::waveform::{PulseWave, SineWave};

/// Diode model parameters (Shockley equation).
#[derive(Debug, Clone, PartialEq)]
pub struct DiodeModel {
    /// Model name as written in the netlist.
    pub name: String,
    /// Saturation current Is (A).
    pub saturation_current: f64,
    /// Ideality factor η.
    pub ideality: f64,
    /// Thermal voltage Vt (V).
    pub thermal_voltage: f64,
}

impl DiodeModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            saturation_current: 1e-12,
            ideality: 1.0,
            thermal_voltage: 0.026,
        }
    }
}

/// Discriminant names used by `list <type>` filtering and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    PulseSource,
    SineSource,
    AcSource,
    Vcvs,
    Vccs,
    Cccs,
    Ccvs,
    Diode,
    Ground,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Resistor => "Resistor",
            ElementKind::Capacitor => "Capacitor",
            ElementKind::Inductor => "Inductor",
            ElementKind::VoltageSource => "VoltageSource",
            ElementKind::CurrentSource => "CurrentSource",
            ElementKind::PulseSource => "PulseSource",
            ElementKind::SineSource => "SineSource",
            ElementKind::AcSource => "AcSource",
            ElementKind::Vcvs => "Vcvs",
            ElementKind::Vccs => "Vccs",
            ElementKind::Cccs => "Cccs",
            ElementKind::Ccvs => "Ccvs",
            ElementKind::Diode => "Diode",
            ElementKind::Ground => "Ground",
        }
    }
}

/// A circuit element.
///
/// Two-terminal kinds carry `n1`/`n2`; the controlled sources additionally
/// carry either a controlling node pair or a controlling branch name. The
/// ground marker has a single terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Resistor {
        name: String,
        n1: String,
        n2: String,
        resistance: f64,
    },
    Capacitor {
        name: String,
        n1: String,
        n2: String,
        capacitance: f64,
    },
    Inductor {
        name: String,
        n1: String,
        n2: String,
        inductance: f64,
    },
    /// DC independent voltage source.
    VoltageSource {
        name: String,
        n1: String,
        n2: String,
        voltage: f64,
    },
    /// DC independent current source (current flows n1 -> n2 internally).
    CurrentSource {
        name: String,
        n1: String,
        n2: String,
        current: f64,
    },
    PulseSource {
        name: String,
        n1: String,
        n2: String,
        wave: PulseWave,
    },
    SineSource {
        name: String,
        n1: String,
        n2: String,
        wave: SineWave,
    },
    /// Small-signal phasor source; participates only in AC analysis.
    AcSource {
        name: String,
        n1: String,
        n2: String,
        magnitude: f64,
        phase_deg: f64,
        frequency: f64,
    },
    /// Voltage-controlled voltage source: V(n1,n2) = gain * V(cn1,cn2).
    Vcvs {
        name: String,
        n1: String,
        n2: String,
        cn1: String,
        cn2: String,
        gain: f64,
    },
    /// Voltage-controlled current source: I(n1->n2) = gm * V(cn1,cn2).
    Vccs {
        name: String,
        n1: String,
        n2: String,
        cn1: String,
        cn2: String,
        gm: f64,
    },
    /// Current-controlled current source: I(n1->n2) = gain * I(branch).
    Cccs {
        name: String,
        n1: String,
        n2: String,
        control_branch: String,
        gain: f64,
    },
    /// Current-controlled voltage source: V(n1,n2) = rm * I(branch).
    Ccvs {
        name: String,
        n1: String,
        n2: String,
        control_branch: String,
        transresistance: f64,
    },
    Diode {
        name: String,
        n1: String,
        n2: String,
        model: DiodeModel,
    },
    /// Ground marker: designates its node as the circuit reference.
    Ground { name: String, node: String },
}

impl Element {
    pub fn name(&self) -> &str {
        match self {
            Element::Resistor { name, .. }
            | Element::Capacitor { name, .. }
            | Element::Inductor { name, .. }
            | Element::VoltageSource { name, .. }
            | Element::CurrentSource { name, .. }
            | Element::PulseSource { name, .. }
            | Element::SineSource { name, .. }
            | Element::AcSource { name, .. }
            | Element::Vcvs { name, .. }
            | Element::Vccs { name, .. }
            | Element::Cccs { name, .. }
            | Element::Ccvs { name, .. }
            | Element::Diode { name, .. }
            | Element::Ground { name, .. } => name,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Resistor { .. } => ElementKind::Resistor,
            Element::Capacitor { .. } => ElementKind::Capacitor,
            Element::Inductor { .. } => ElementKind::Inductor,
            Element::VoltageSource { .. } => ElementKind::VoltageSource,
            Element::CurrentSource { .. } => ElementKind::CurrentSource,
            Element::PulseSource { .. } => ElementKind::PulseSource,
            Element::SineSource { .. } => ElementKind::SineSource,
            Element::AcSource { .. } => ElementKind::AcSource,
            Element::Vcvs { .. } => ElementKind::Vcvs,
            Element::Vccs { .. } => ElementKind::Vccs,
            Element::Cccs { .. } => ElementKind::Cccs,
            Element::Ccvs { .. } => ElementKind::Ccvs,
            Element::Diode { .. } => ElementKind::Diode,
            Element::Ground { .. } => ElementKind::Ground,
        }
    }

    /// Every node key this element references, control nodes included.
    pub fn nodes(&self) -> Vec<&str> {
        match self {
            Element::Resistor { n1, n2, .. }
            | Element::Capacitor { n1, n2, .. }
            | Element::Inductor { n1, n2, .. }
            | Element::VoltageSource { n1, n2, .. }
            | Element::CurrentSource { n1, n2, .. }
            | Element::PulseSource { n1, n2, .. }
            | Element::SineSource { n1, n2, .. }
            | Element::AcSource { n1, n2, .. }
            | Element::Cccs { n1, n2, .. }
            | Element::Ccvs { n1, n2, .. }
            | Element::Diode { n1, n2, .. } => vec![n1.as_str(), n2.as_str()],
            Element::Vcvs { n1, n2, cn1, cn2, .. }
            | Element::Vccs { n1, n2, cn1, cn2, .. } => {
                vec![n1.as_str(), n2.as_str(), cn1.as_str(), cn2.as_str()]
            }
            Element::Ground { node, .. } => vec![node.as_str()],
        }
    }

    /// Rewrite every reference to node `old` with `new`.
    pub(crate) fn rename_node(&mut self, old: &str, new: &str) {
        let rewrite = |field: &mut String| {
            if *field == old {
                *field = new.to_string();
            }
        };
        match self {
            Element::Resistor { n1, n2, .. }
            | Element::Capacitor { n1, n2, .. }
            | Element::Inductor { n1, n2, .. }
            | Element::VoltageSource { n1, n2, .. }
            | Element::CurrentSource { n1, n2, .. }
            | Element::PulseSource { n1, n2, .. }
            | Element::SineSource { n1, n2, .. }
            | Element::AcSource { n1, n2, .. }
            | Element::Cccs { n1, n2, .. }
            | Element::Ccvs { n1, n2, .. }
            | Element::Diode { n1, n2, .. } => {
                rewrite(n1);
                rewrite(n2);
            }
            Element::Vcvs { n1, n2, cn1, cn2, .. }
            | Element::Vccs { n1, n2, cn1, cn2, .. } => {
                rewrite(n1);
                rewrite(n2);
                rewrite(cn1);
                rewrite(cn2);
            }
            Element::Ground { node, .. } => rewrite(node),
        }
    }

    /// True for the kinds a DC sweep may drive.
    pub fn is_swept_source(&self) -> bool {
        matches!(
            self,
            Element::VoltageSource { .. } | Element::CurrentSource { .. }
        )
    }

    /// Overwrite a swept source's value. Returns false for other kinds.
    pub fn set_source_value(&mut self, value: f64) -> bool {
        match self {
            Element::VoltageSource { voltage, .. } => {
                *voltage = value;
                true
            }
            Element::CurrentSource { current, .. } => {
                *current = value;
                true
            }
            _ => false,
        }
    }

    /// The `add` command line that reproduces this element, used by
    /// `list` and `save`. Kinds without a netlist grammar are written as
    /// comment lines so a saved file still replays cleanly.
    pub fn command_string(&self) -> String {
        match self {
            Element::Resistor { name, n1, n2, resistance } => {
                format!("add R {name} {n1} {n2} {resistance}")
            }
            Element::Capacitor { name, n1, n2, capacitance } => {
                format!("add C {name} {n1} {n2} {capacitance}")
            }
            Element::Inductor { name, n1, n2, inductance } => {
                format!("add L {name} {n1} {n2} {inductance}")
            }
            Element::VoltageSource { name, n1, n2, voltage } => {
                format!("add V {name} {n1} {n2} {voltage}")
            }
            Element::CurrentSource { name, n1, n2, current } => {
                format!("add I {name} {n1} {n2} {current}")
            }
            Element::PulseSource { name, n1, n2, wave } => format!(
                "add V {name} {n1} {n2} PULSE ( {} {} {} {} {} {} {} )",
                wave.v1, wave.v2, wave.td, wave.tr, wave.tf, wave.pw, wave.per
            ),
            Element::SineSource { name, n1, n2, wave } => format!(
                "add V {name} {n1} {n2} SIN ( {} {} {} )",
                wave.offset, wave.amplitude, wave.frequency
            ),
            Element::AcSource { name, n1, n2, magnitude, phase_deg, frequency } => {
                format!("* ac source {name} {n1} {n2} {magnitude} {phase_deg} {frequency}")
            }
            Element::Vcvs { name, n1, n2, cn1, cn2, gain } => {
                format!("add E {name} {n1} {n2} {cn1} {cn2} {gain}")
            }
            Element::Vccs { name, n1, n2, cn1, cn2, gm } => {
                format!("* vccs {name} {n1} {n2} {cn1} {cn2} {gm}")
            }
            Element::Cccs { name, n1, n2, control_branch, gain } => {
                format!("* cccs {name} {n1} {n2} {control_branch} {gain}")
            }
            Element::Ccvs { name, n1, n2, control_branch, transresistance } => {
                format!("* ccvs {name} {n1} {n2} {control_branch} {transresistance}")
            }
            Element::Diode { name, n1, n2, model } => {
                format!("add D {name} {n1} {n2} {}", model.name)
            }
            Element::Ground { node, .. } => format!("add GND {node}"),
        }
    }
}
