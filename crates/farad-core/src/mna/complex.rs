//! Complex MNA assembly for small-signal AC analysis.

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::circuit::Circuit;
use crate::element::Element;

/// Angular-frequency floor below which an inductor's admittance would
/// blow up; below it the inductor is stamped as a large finite
/// admittance instead (a near-short, matching its DC behavior).
pub const MIN_AC_OMEGA: f64 = 1e-9;

/// Admittance used for an inductor below the frequency floor.
pub const INDUCTOR_DC_ADMITTANCE: f64 = 1e12;

/// Index layout of the AC phasor system: alphabetical non-ground nodes,
/// then one branch row per phasor-capable source (DC voltage source,
/// sinusoidal source, AC source) in first-encounter order.
#[derive(Debug, Clone)]
pub struct AcLayout {
    pub nodes: IndexMap<String, usize>,
    pub sources: IndexMap<String, usize>,
}

impl AcLayout {
    pub fn for_circuit(circuit: &Circuit) -> Self {
        let nodes = circuit.non_ground_nodes();
        let mut sources = IndexMap::new();
        for element in circuit.elements() {
            match element {
                Element::VoltageSource { name, .. }
                | Element::SineSource { name, .. }
                | Element::AcSource { name, .. } => {
                    let idx = sources.len();
                    sources.insert(name.clone(), idx);
                }
                _ => {}
            }
        }
        Self { nodes, sources }
    }

    pub fn size(&self) -> usize {
        self.nodes.len() + self.sources.len()
    }

    pub fn node_index(&self, key: &str) -> Option<usize> {
        self.nodes.get(key).copied()
    }

    /// Absolute branch row of a phasor source.
    pub fn source_row(&self, name: &str) -> Option<usize> {
        self.sources.get(name).map(|i| self.nodes.len() + i)
    }
}

/// Build the complex admittance system at angular frequency `omega`.
///
/// The right-hand side comes back all-zero; the AC driver writes unit
/// amplitude into the excitation source's branch row. Dependent sources,
/// diodes, and pulse sources do not contribute to the phasor system.
pub fn assemble_ac(
    circuit: &Circuit,
    layout: &AcLayout,
    omega: f64,
) -> (DMatrix<Complex<f64>>, DVector<Complex<f64>>) {
    let size = layout.size();
    let mut a = DMatrix::zeros(size, size);
    let b = DVector::zeros(size);
    let j = Complex::new(0.0, 1.0);
    let one = Complex::new(1.0, 0.0);

    for element in circuit.elements() {
        let admittance: Option<Complex<f64>> = match element {
            Element::Resistor { resistance, .. } if *resistance != 0.0 => {
                Some(Complex::new(1.0 / resistance, 0.0))
            }
            Element::Capacitor { capacitance, .. } => Some(j * omega * *capacitance),
            Element::Inductor { inductance, .. } => {
                if omega > MIN_AC_OMEGA {
                    Some(one / (j * omega * *inductance))
                } else {
                    Some(Complex::new(INDUCTOR_DC_ADMITTANCE, 0.0))
                }
            }
            _ => None,
        };

        if let Some(y) = admittance {
            let terminals = element.nodes();
            let k1 = layout.node_index(terminals[0]);
            let k2 = layout.node_index(terminals[1]);
            if let Some(i) = k1 {
                a[(i, i)] += y;
            }
            if let Some(i) = k2 {
                a[(i, i)] += y;
            }
            if let (Some(i), Some(k)) = (k1, k2) {
                a[(i, k)] -= y;
                a[(k, i)] -= y;
            }
            continue;
        }

        if let Some(row) = layout.source_row(element.name()) {
            let terminals = element.nodes();
            let k1 = layout.node_index(terminals[0]);
            let k2 = layout.node_index(terminals[1]);
            if let Some(i) = k1 {
                a[(i, row)] += one;
                a[(row, i)] += one;
            }
            if let Some(i) = k2 {
                a[(i, row)] -= one;
                a[(row, i)] -= one;
            }
        }
    }

    (a, b)
}
