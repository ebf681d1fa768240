//! Command grammar for the interactive netlist front end.

use std::path::PathBuf;

use farad_core::{DiodeModel, Element, PulseWave, SineWave};

use crate::error::{Error, Result};
use crate::value::parse_value;

/// Frequency grid keyword of the `ac` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcSweepMode {
    Lin,
    Dec,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `add ...`: create an element (nodes appear implicitly).
    Add(Box<Element>),
    /// `delete <name>`.
    Delete(String),
    /// `list [type]`.
    List(Option<String>),
    /// `.nodes`.
    Nodes,
    /// `rename node <old> <new>`.
    RenameNode { old: String, new: String },
    /// `tran <Tstep> <Tstop> [UIC]`.
    Tran { tstep: f64, tstop: f64, uic: bool },
    /// `dc <source> <start> <end> <inc>`.
    DcSweep {
        source: String,
        start: f64,
        stop: f64,
        increment: f64,
    },
    /// `ac <source> <fstart> <fstop> <npoints> <LIN|DEC>`.
    AcSweep {
        source: String,
        fstart: f64,
        fstop: f64,
        num_points: usize,
        mode: AcSweepMode,
    },
    /// `save <path>`.
    Save(PathBuf),
    /// `newfile <path>`.
    NewFile(PathBuf),
}

/// Split a line into tokens, dropping everything from a `*` or `;`
/// comment marker onward.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for token in line.split_whitespace() {
        if token.starts_with('*') || token.starts_with(';') {
            break;
        }
        tokens.push(token);
    }
    tokens
}

/// Parse one command line. Blank and comment-only lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return Ok(None);
    }
    parse_tokens(&tokens).map(Some)
}

fn parse_tokens(tokens: &[&str]) -> Result<Command> {
    let verb = tokens[0].to_ascii_lowercase();
    match verb.as_str() {
        "add" => parse_add(tokens),
        "delete" => {
            expect_len(tokens, 2, "delete <element_name>")?;
            Ok(Command::Delete(tokens[1].to_string()))
        }
        "list" => match tokens.len() {
            1 => Ok(Command::List(None)),
            2 => Ok(Command::List(Some(tokens[1].to_string()))),
            _ => Err(Error::Syntax("usage: list [type]".into())),
        },
        ".nodes" => {
            expect_len(tokens, 1, ".nodes")?;
            Ok(Command::Nodes)
        }
        "rename" => {
            if tokens.len() != 4 || !tokens[1].eq_ignore_ascii_case("node") {
                return Err(Error::Syntax("usage: rename node <old> <new>".into()));
            }
            Ok(Command::RenameNode {
                old: tokens[2].to_string(),
                new: tokens[3].to_string(),
            })
        }
        "tran" => {
            if tokens.len() < 3 || tokens.len() > 4 {
                return Err(Error::Syntax("usage: tran <Tstep> <Tstop> [UIC]".into()));
            }
            let uic = match tokens.get(3) {
                None => false,
                Some(flag) if flag.eq_ignore_ascii_case("uic") => true,
                Some(flag) => {
                    return Err(Error::Syntax(format!(
                        "invalid option '{flag}', did you mean 'UIC'?"
                    )));
                }
            };
            Ok(Command::Tran {
                tstep: parse_value(tokens[1])?,
                tstop: parse_value(tokens[2])?,
                uic,
            })
        }
        "dc" => {
            expect_len(tokens, 5, "dc <source> <start> <end> <inc>")?;
            Ok(Command::DcSweep {
                source: tokens[1].to_string(),
                start: parse_value(tokens[2])?,
                stop: parse_value(tokens[3])?,
                increment: parse_value(tokens[4])?,
            })
        }
        "ac" => {
            expect_len(tokens, 6, "ac <source> <fstart> <fstop> <npoints> <LIN|DEC>")?;
            let mode = if tokens[5].eq_ignore_ascii_case("lin") {
                AcSweepMode::Lin
            } else if tokens[5].eq_ignore_ascii_case("dec") {
                AcSweepMode::Dec
            } else {
                return Err(Error::Syntax(format!(
                    "invalid sweep type '{}', expected LIN or DEC",
                    tokens[5]
                )));
            };
            let num_points = tokens[4]
                .parse::<usize>()
                .map_err(|_| Error::InvalidNumber(tokens[4].to_string()))?;
            Ok(Command::AcSweep {
                source: tokens[1].to_string(),
                fstart: parse_value(tokens[2])?,
                fstop: parse_value(tokens[3])?,
                num_points,
                mode,
            })
        }
        "save" => {
            expect_len(tokens, 2, "save <path>")?;
            Ok(Command::Save(PathBuf::from(tokens[1])))
        }
        "newfile" => {
            expect_len(tokens, 2, "newfile <path>")?;
            Ok(Command::NewFile(PathBuf::from(tokens[1])))
        }
        _ => Err(Error::UnknownCommand(tokens[0].to_string())),
    }
}

fn expect_len(tokens: &[&str], len: usize, usage: &str) -> Result<()> {
    if tokens.len() != len {
        return Err(Error::Syntax(format!("usage: {usage}")));
    }
    Ok(())
}

fn parse_add(tokens: &[&str]) -> Result<Command> {
    if tokens.len() < 3 {
        return Err(Error::Syntax(
            "usage: add <type> <name> <nodes...> <params...>".into(),
        ));
    }
    let kind = tokens[1].to_ascii_uppercase();

    let element = match kind.as_str() {
        "GND" => {
            expect_len(tokens, 3, "add GND <node>")?;
            Element::Ground {
                name: "GND".into(),
                node: tokens[2].to_string(),
            }
        }
        "R" | "C" | "L" | "I" => {
            expect_len(tokens, 6, "add <type> <name> <n1> <n2> <value>")?;
            let name = tokens[2].to_string();
            let n1 = tokens[3].to_string();
            let n2 = tokens[4].to_string();
            let value = parse_value(tokens[5])?;
            match kind.as_str() {
                "R" => Element::Resistor { name, n1, n2, resistance: value },
                "C" => Element::Capacitor { name, n1, n2, capacitance: value },
                "L" => Element::Inductor { name, n1, n2, inductance: value },
                _ => Element::CurrentSource { name, n1, n2, current: value },
            }
        }
        "V" => parse_voltage_source(tokens)?,
        "E" => {
            expect_len(tokens, 8, "add E <name> <n1> <n2> <cn1> <cn2> <gain>")?;
            Element::Vcvs {
                name: tokens[2].to_string(),
                n1: tokens[3].to_string(),
                n2: tokens[4].to_string(),
                cn1: tokens[5].to_string(),
                cn2: tokens[6].to_string(),
                gain: parse_value(tokens[7])?,
            }
        }
        "D" => {
            expect_len(tokens, 6, "add D <name> <n1> <n2> <model>")?;
            Element::Diode {
                name: tokens[2].to_string(),
                n1: tokens[3].to_string(),
                n2: tokens[4].to_string(),
                model: DiodeModel::new(tokens[5]),
            }
        }
        other => return Err(Error::UnknownElement(other.to_string())),
    };
    Ok(Command::Add(Box::new(element)))
}

fn parse_voltage_source(tokens: &[&str]) -> Result<Element> {
    if tokens.len() < 6 {
        return Err(Error::Syntax("usage: add V <name> <n1> <n2> <value>".into()));
    }
    let name = tokens[2].to_string();
    let n1 = tokens[3].to_string();
    let n2 = tokens[4].to_string();

    if tokens[5].eq_ignore_ascii_case("pulse") {
        // add V <name> <n1> <n2> PULSE ( V1 V2 Td Tr Tf Pw Per )
        if tokens.len() != 15 || tokens[6] != "(" || tokens[14] != ")" {
            return Err(Error::Syntax(
                "usage: add V <name> <n1> <n2> PULSE ( V1 V2 Td Tr Tf Pw Per )".into(),
            ));
        }
        Ok(Element::PulseSource {
            name,
            n1,
            n2,
            wave: PulseWave {
                v1: parse_value(tokens[7])?,
                v2: parse_value(tokens[8])?,
                td: parse_value(tokens[9])?,
                tr: parse_value(tokens[10])?,
                tf: parse_value(tokens[11])?,
                pw: parse_value(tokens[12])?,
                per: parse_value(tokens[13])?,
            },
        })
    } else if tokens[5].eq_ignore_ascii_case("sin") {
        // add V <name> <n1> <n2> SIN ( Voff Vamp f )
        if tokens.len() != 11 || tokens[6] != "(" || tokens[10] != ")" {
            return Err(Error::Syntax(
                "usage: add V <name> <n1> <n2> SIN ( Voffset Vamplitude Frequency )".into(),
            ));
        }
        Ok(Element::SineSource {
            name,
            n1,
            n2,
            wave: SineWave {
                offset: parse_value(tokens[7])?,
                amplitude: parse_value(tokens[8])?,
                frequency: parse_value(tokens[9])?,
            },
        })
    } else {
        if tokens.len() != 6 {
            return Err(Error::Syntax("usage: add V <name> <n1> <n2> <value>".into()));
        }
        Ok(Element::VoltageSource {
            name,
            n1,
            n2,
            voltage: parse_value(tokens[5])?,
        })
    }
}
