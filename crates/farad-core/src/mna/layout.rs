//! Unknown-vector layout for the real MNA system.

use indexmap::IndexMap;

use crate::circuit::Circuit;
use crate::element::Element;
use crate::error::{Error, Result};

/// Index layout of the MNA unknown vector.
///
/// Rows/columns are, in order: one KCL row per non-ground node
/// (alphabetical by key), then one branch-current row per
/// voltage-source-like element (independent, pulse, sinusoidal, VCVS),
/// then one per inductor, then one per CCVS. Within each branch group
/// the order is first encounter in the element sequence. Every analysis
/// that claims reproducible intermediate output depends on this layout.
#[derive(Debug, Clone)]
pub struct SystemLayout {
    /// Non-ground node key -> index in [0, n).
    pub nodes: IndexMap<String, usize>,
    /// Voltage-source-like element name -> group-local index.
    pub vsources: IndexMap<String, usize>,
    /// Inductor name -> group-local index.
    pub inductors: IndexMap<String, usize>,
    /// CCVS name -> group-local index.
    pub ccvs: IndexMap<String, usize>,
}

impl SystemLayout {
    /// Enumerate the circuit and build the layout.
    ///
    /// Fails with `InvalidParameter` when a CCCS/CCVS names a controlling
    /// branch that is not a voltage source or inductor in this circuit;
    /// the assembler itself never fails, so reference integrity is
    /// checked here, before any assembly.
    pub fn for_circuit(circuit: &Circuit) -> Result<Self> {
        let nodes = circuit.non_ground_nodes();

        let mut vsources = IndexMap::new();
        let mut inductors = IndexMap::new();
        let mut ccvs = IndexMap::new();
        for element in circuit.elements() {
            match element {
                Element::VoltageSource { name, .. }
                | Element::PulseSource { name, .. }
                | Element::SineSource { name, .. }
                | Element::Vcvs { name, .. } => {
                    let idx = vsources.len();
                    vsources.insert(name.clone(), idx);
                }
                Element::Inductor { name, .. } => {
                    let idx = inductors.len();
                    inductors.insert(name.clone(), idx);
                }
                Element::Ccvs { name, .. } => {
                    let idx = ccvs.len();
                    ccvs.insert(name.clone(), idx);
                }
                _ => {}
            }
        }

        let layout = Self {
            nodes,
            vsources,
            inductors,
            ccvs,
        };

        for element in circuit.elements() {
            let (name, branch) = match element {
                Element::Cccs { name, control_branch, .. }
                | Element::Ccvs { name, control_branch, .. } => (name, control_branch),
                _ => continue,
            };
            if layout.branch_column(branch).is_none() {
                return Err(Error::InvalidParameter(format!(
                    "'{name}' references branch '{branch}', which is not a voltage source or inductor"
                )));
            }
        }
        Ok(layout)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_vsources(&self) -> usize {
        self.vsources.len()
    }

    pub fn num_inductors(&self) -> usize {
        self.inductors.len()
    }

    pub fn num_ccvs(&self) -> usize {
        self.ccvs.len()
    }

    /// Total unknown count: n + nV + nL + nM.
    pub fn size(&self) -> usize {
        self.nodes.len() + self.vsources.len() + self.inductors.len() + self.ccvs.len()
    }

    /// KCL row of a node key; `None` for ground or unknown keys, which
    /// simply drop their writes.
    pub fn node_index(&self, key: &str) -> Option<usize> {
        self.nodes.get(key).copied()
    }

    /// Absolute row of a voltage-source-like element's branch current.
    pub fn vsource_row(&self, name: &str) -> Option<usize> {
        self.vsources.get(name).map(|i| self.nodes.len() + i)
    }

    /// Absolute row of an inductor's branch current.
    pub fn inductor_row(&self, name: &str) -> Option<usize> {
        self.inductors
            .get(name)
            .map(|i| self.nodes.len() + self.vsources.len() + i)
    }

    /// Absolute row of a CCVS branch current.
    pub fn ccvs_row(&self, name: &str) -> Option<usize> {
        self.ccvs
            .get(name)
            .map(|i| self.nodes.len() + self.vsources.len() + self.inductors.len() + i)
    }

    /// Column of a controlling branch's current unknown: a voltage
    /// source or an inductor (the state-variable branches a CCCS/CCVS
    /// may reference).
    pub fn branch_column(&self, name: &str) -> Option<usize> {
        self.vsource_row(name).or_else(|| self.inductor_row(name))
    }
}
