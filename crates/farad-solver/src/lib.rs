//! Linear solvers and analysis drivers for Farad.
//!
//! The solvers are dense and direct: Gaussian elimination with partial
//! pivoting (the robust default), Doolittle LU without pivoting, and a
//! complex-valued elimination for AC analysis. The drivers orchestrate
//! repeated assembly and solving over an analysis dimension (time, sweep
//! value, frequency) and collect results keyed by signal name.

pub mod analysis;
pub mod complex;
pub mod linear;

pub use analysis::{
    AcSweepAnalysis, AcSweepType, DcSweepAnalysis, TransientAnalysis, current_signal,
    voltage_signal,
};
pub use complex::solve_complex;
pub use linear::{GaussianElimination, LinearSolver, LuDecomposition, PIVOT_FLOOR};
