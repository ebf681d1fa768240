//! Tabular result printing.

use farad_solver::{AcSweepAnalysis, DcSweepAnalysis, TransientAnalysis};

/// Print the transient result table: time column followed by every
/// signal in name order.
pub fn print_transient(analysis: &TransientAnalysis) {
    let names: Vec<&String> = analysis.signals.keys().collect();

    print!("{:>14}", "Time");
    for name in &names {
        print!("{:>14}", name);
    }
    println!();
    println!("{}", "-".repeat(14 * (1 + names.len())));

    for (i, t) in analysis.time_points.iter().enumerate() {
        print!("{:>14.6e}", t);
        for name in &names {
            print!("{:>14.6}", analysis.signals[*name][i]);
        }
        println!();
    }

    println!();
    println!(
        "Transient analysis complete ({} points).",
        analysis.time_points.len()
    );
}

/// Print the DC sweep table: swept value column followed by every
/// signal in name order.
pub fn print_dc_sweep(analysis: &DcSweepAnalysis) {
    let names: Vec<&String> = analysis.signals.keys().collect();

    print!("{:>14}", analysis.source_name());
    for name in &names {
        print!("{:>14}", name);
    }
    println!();
    println!("{}", "-".repeat(14 * (1 + names.len())));

    for (i, v) in analysis.sweep_values.iter().enumerate() {
        print!("{:>14.4}", v);
        for name in &names {
            print!("{:>14.6}", analysis.signals[*name][i]);
        }
        println!();
    }

    println!();
    println!("Sweep complete ({} points).", analysis.sweep_values.len());
}

/// Print the AC sweep table: frequency column, then magnitude and phase
/// (degrees) per node signal.
pub fn print_ac_sweep(analysis: &AcSweepAnalysis) {
    let names: Vec<&String> = analysis.signals.keys().collect();

    print!("{:>14}", "Frequency");
    for name in &names {
        print!("{:>14}{:>14}", format!("|{name}|"), format!("ph({name})"));
    }
    println!();
    println!("{}", "-".repeat(14 * (1 + 2 * names.len())));

    for (i, f) in analysis.frequency_points.iter().enumerate() {
        print!("{:>14.6e}", f);
        for name in &names {
            let z = analysis.signals[*name][i];
            print!("{:>14.6}{:>14.4}", z.norm(), z.arg().to_degrees());
        }
        println!();
    }

    println!();
    println!(
        "AC sweep complete ({} points).",
        analysis.frequency_points.len()
    );
}
