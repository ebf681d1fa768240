//! Farad interactive command-line front end.
//!
//! Reads command lines from stdin (or replays a netlist file first),
//! applies circuit mutations, and runs analyses, printing their result
//! tables. Per-line errors are reported and the session continues.

mod output;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use farad_core::Circuit;
use farad_parser::{AcSweepMode, Command, parse_line};
use farad_solver::{
    AcSweepAnalysis, AcSweepType, DcSweepAnalysis, GaussianElimination, TransientAnalysis,
};

#[derive(Parser)]
#[command(name = "farad")]
#[command(about = "Interactive SPICE-style circuit simulator")]
#[command(version)]
struct Cli {
    /// Netlist file to replay before the interactive session.
    #[arg(short, long)]
    file: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut circuit = Circuit::new();
    if let Some(path) = &cli.file {
        replay_file(&mut circuit, path)?;
    }

    let stdin = io::stdin();
    prompt();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        match parse_line(&line) {
            Ok(Some(command)) => {
                if let Err(e) = execute(&mut circuit, command) {
                    eprintln!("error: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("error: {e}"),
        }
        prompt();
    }
    Ok(())
}

fn prompt() {
    print!("farad> ");
    let _ = io::stdout().flush();
}

fn execute(circuit: &mut Circuit, command: Command) -> Result<()> {
    match command {
        Command::Add(element) => {
            let name = element.name().to_string();
            circuit.add_element(*element)?;
            println!("Added element: {name}");
        }
        Command::Delete(name) => {
            circuit.delete_element(&name)?;
            println!("Deleted element: {name}");
        }
        Command::List(filter) => {
            for line in circuit.list_elements(filter.as_deref()) {
                println!("- {line}");
            }
        }
        Command::Nodes => {
            for node in circuit.nodes() {
                let marker = if node.is_ground() { " (Ground)" } else { "" };
                println!("- {}{}", node.id(), marker);
            }
        }
        Command::RenameNode { old, new } => {
            circuit.rename_node(&old, &new)?;
            println!("Renamed node {old} -> {new}");
        }
        Command::Tran { tstep, tstop, uic } => {
            let mut analysis = TransientAnalysis::new(tstep, tstop, uic)?;
            analysis.run(circuit, &GaussianElimination)?;
            output::print_transient(&analysis);
        }
        Command::DcSweep { source, start, stop, increment } => {
            let mut analysis = DcSweepAnalysis::new(source, start, stop, increment)?;
            analysis.run(circuit, &GaussianElimination)?;
            output::print_dc_sweep(&analysis);
        }
        Command::AcSweep { source, fstart, fstop, num_points, mode } => {
            let sweep_type = match mode {
                AcSweepMode::Lin => AcSweepType::Lin,
                AcSweepMode::Dec => AcSweepType::Dec,
            };
            let mut analysis =
                AcSweepAnalysis::new(source, fstart, fstop, num_points, sweep_type)?;
            analysis.run(circuit)?;
            output::print_ac_sweep(&analysis);
        }
        Command::Save(path) => {
            save_circuit(circuit, &path)?;
            println!("Saved circuit to {}", path.display());
        }
        Command::NewFile(path) => {
            circuit.clear();
            replay_file(circuit, &path)?;
        }
    }
    Ok(())
}

/// Replay the circuit-mutation commands of a netlist file. Analysis and
/// file commands are skipped; per-line failures are reported and the
/// replay continues.
fn replay_file(circuit: &mut Circuit, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not open file: {}", path.display()))?;

    println!("Loading circuit from: {}", path.display());
    for (lineno, line) in text.lines().enumerate() {
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}:{}: {e}", path.display(), lineno + 1);
                continue;
            }
        };
        let result = match command {
            Command::Add(element) => circuit.add_element(*element).err(),
            Command::Delete(name) => circuit.delete_element(&name).err(),
            Command::RenameNode { old, new } => circuit.rename_node(&old, &new).err(),
            _ => None,
        };
        if let Some(e) = result {
            eprintln!("{}:{}: {e}", path.display(), lineno + 1);
        }
    }
    println!("File parsing complete.");
    Ok(())
}

fn save_circuit(circuit: &Circuit, path: &Path) -> Result<()> {
    let mut lines: Vec<String> = circuit.elements().map(|e| e.command_string()).collect();
    lines.push(String::new());
    fs::write(path, lines.join("\n"))
        .with_context(|| format!("could not save circuit to {}", path.display()))
}
