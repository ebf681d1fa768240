//! Core circuit representation and MNA assembly for Farad.
//!
//! This crate owns the data model (nodes, elements, the circuit
//! container with its carried transient state) and the dense MNA
//! assemblers for the real and complex systems. Solvers and analysis
//! drivers live in `farad-solver`.

pub mod circuit;
pub mod element;
pub mod error;
pub mod mna;
pub mod node;
pub mod waveform;

pub use circuit::Circuit;
pub use element::{DiodeModel, Element, ElementKind};
pub use error::{Error, Result};
pub use node::Node;
pub use waveform::{PulseWave, SineWave};
