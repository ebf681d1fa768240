//! Circuit container: owns nodes and elements, designates ground, and
//! carries the previous-timestep state used by reactive and nonlinear
//! devices.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::node::Node;

/// A circuit: a node map, an ordered element sequence, and the state
/// carried between transient timesteps.
///
/// Nodes live in a `BTreeMap` so enumeration (and therefore MNA matrix
/// layout) is alphabetical by key and reproducible across runs. Elements
/// live in an `IndexMap` keyed by name, preserving insertion order.
#[derive(Debug, Default)]
pub struct Circuit {
    nodes: BTreeMap<String, Node>,
    elements: IndexMap<String, Element>,
    ground: Option<String>,
    /// Node voltages from the previous accepted timestep (or operating
    /// point iteration), keyed by node id.
    pub previous_node_voltages: HashMap<String, f64>,
    /// Inductor branch currents from the previous accepted timestep,
    /// keyed by element name.
    pub previous_inductor_currents: HashMap<String, f64>,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_create_node(&mut self, id: &str) {
        if !self.nodes.contains_key(id) {
            self.nodes.insert(id.to_string(), Node::new(id));
        }
    }

    /// Add an element, creating any node it references.
    ///
    /// Fails with `DuplicateName` when the name is taken and with
    /// `InvalidParameter` for a non-positive inductance. A ground marker
    /// designates its node as the circuit reference.
    pub fn add_element(&mut self, element: Element) -> Result<()> {
        let name = element.name().to_string();
        if self.elements.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        if let Element::Inductor { inductance, .. } = &element {
            if *inductance <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "inductance of '{name}' must be positive"
                )));
            }
        }

        for node in element.nodes() {
            let node = node.to_string();
            self.get_or_create_node(&node);
        }
        if let Element::Ground { node, .. } = &element {
            let node = node.clone();
            self.set_ground(&node);
        }
        self.elements.insert(name, element);
        Ok(())
    }

    /// Delete an element by name. Nodes orphaned by the deletion are
    /// retained; only `clear` drops them.
    pub fn delete_element(&mut self, name: &str) -> Result<()> {
        self.elements
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Drop every node, element, and carried state.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.elements.clear();
        self.ground = None;
        self.previous_node_voltages.clear();
        self.previous_inductor_currents.clear();
    }

    fn set_ground(&mut self, node_id: &str) {
        if let Some(old) = self.ground.take() {
            if let Some(node) = self.nodes.get_mut(&old) {
                node.clear_ground();
            }
        }
        self.get_or_create_node(node_id);
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.set_as_ground();
        }
        self.ground = Some(node_id.to_string());
    }

    pub fn ground_node_id(&self) -> Option<&str> {
        self.ground.as_deref()
    }

    pub fn has_ground(&self) -> bool {
        self.ground.is_some()
    }

    /// Move a node key, rewriting every referring element field
    /// (control nodes included).
    pub fn rename_node(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.nodes.contains_key(old) {
            return Err(Error::NotFound(old.to_string()));
        }
        if self.nodes.contains_key(new) {
            return Err(Error::Conflict(new.to_string()));
        }

        let mut node = self.nodes.remove(old).expect("checked above");
        node.set_id(new);
        self.nodes.insert(new.to_string(), node);

        if self.ground.as_deref() == Some(old) {
            self.ground = Some(new.to_string());
        }
        for element in self.elements.values_mut() {
            element.rename_node(old, new);
        }
        Ok(())
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    pub fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements.get_mut(name)
    }

    pub fn has_element(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Nodes in alphabetical key order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_non_ground_nodes(&self) -> usize {
        self.nodes.values().filter(|n| !n.is_ground()).count()
    }

    /// Non-ground nodes in alphabetical order, each mapped to its index
    /// in `[0, n)`. This ordering is the matrix layout contract.
    pub fn non_ground_nodes(&self) -> IndexMap<String, usize> {
        self.nodes
            .values()
            .filter(|n| !n.is_ground())
            .enumerate()
            .map(|(i, n)| (n.id().to_string(), i))
            .collect()
    }

    /// Pre-analysis guard: true iff every node is reachable from any
    /// starting node, walking element terminals (control nodes count as
    /// terminals).
    pub fn is_connected(&self) -> bool {
        if self.nodes.is_empty() {
            return true;
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let start = self.nodes.keys().next().expect("nonempty").as_str();
        visited.insert(start);
        queue.push_back(start);

        while let Some(u) = queue.pop_front() {
            for element in self.elements.values() {
                let terminals = element.nodes();
                if !terminals.iter().any(|t| *t == u) {
                    continue;
                }
                for t in terminals {
                    if visited.insert(t) {
                        queue.push_back(t);
                    }
                }
            }
        }
        visited.len() == self.nodes.len()
    }

    /// Bulk-replace the carried node voltages. Called by the transient
    /// driver after each accepted sample.
    pub fn update_previous_node_voltages(&mut self, voltages: HashMap<String, f64>) {
        self.previous_node_voltages = voltages;
    }

    /// Bulk-replace the carried inductor currents.
    pub fn update_previous_inductor_currents(&mut self, currents: HashMap<String, f64>) {
        self.previous_inductor_currents = currents;
    }

    /// Mirror the latest operating point onto the nodes for display.
    pub fn set_node_voltage(&mut self, id: &str, voltage: f64) {
        if let Some(node) = self.nodes.get_mut(id) {
            if !node.is_ground() {
                node.set_voltage(voltage);
            }
        }
    }

    /// Element command strings, optionally filtered by kind name.
    pub fn list_elements(&self, kind_filter: Option<&str>) -> Vec<String> {
        self.elements
            .values()
            .filter(|e| match kind_filter {
                Some(kind) => e.kind().as_str().eq_ignore_ascii_case(kind),
                None => true,
            })
            .map(|e| e.command_string())
            .collect()
    }
}
