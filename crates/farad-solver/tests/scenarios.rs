//! End-to-end analysis scenarios on small reference circuits.
//!
//! Transient expectations account for backward-Euler discretization at
//! the chosen timestep; the analytic values are approached as the step
//! shrinks. AC expectations are exact up to solver round-off.

use std::f64::consts::PI;

use farad_core::{Circuit, DiodeModel, Element, PulseWave};
use farad_solver::{
    AcSweepAnalysis, AcSweepType, DcSweepAnalysis, GaussianElimination, TransientAnalysis,
};

fn ground(node: &str) -> Element {
    Element::Ground {
        name: "GND".into(),
        node: node.into(),
    }
}

fn vsource(name: &str, n1: &str, n2: &str, v: f64) -> Element {
    Element::VoltageSource {
        name: name.into(),
        n1: n1.into(),
        n2: n2.into(),
        voltage: v,
    }
}

fn resistor(name: &str, n1: &str, n2: &str, r: f64) -> Element {
    Element::Resistor {
        name: name.into(),
        n1: n1.into(),
        n2: n2.into(),
        resistance: r,
    }
}

fn capacitor(name: &str, n1: &str, n2: &str, c: f64) -> Element {
    Element::Capacitor {
        name: name.into(),
        n1: n1.into(),
        n2: n2.into(),
        capacitance: c,
    }
}

/// Index of the sample closest to `t`.
fn sample_at(times: &[f64], t: f64) -> usize {
    times
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - t).abs().partial_cmp(&(*b - t).abs()).unwrap()
        })
        .map(|(i, _)| i)
        .unwrap()
}

#[test]
fn resistive_divider_dc_operating_point() {
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "N1", "0", 10.0)).unwrap();
    c.add_element(resistor("R1", "N1", "N2", 1e3)).unwrap();
    c.add_element(resistor("R2", "N2", "0", 2e3)).unwrap();
    c.add_element(ground("0")).unwrap();

    // A zero-length march records exactly the operating point.
    let mut tran = TransientAnalysis::new(1e-6, 0.0, false).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    assert_eq!(tran.time_points.len(), 1);
    let v = |name: &str| tran.signals[name][0];
    assert!((v("V(N1)") - 10.0).abs() < 1e-6);
    assert!((v("V(N2)") - 20.0 / 3.0).abs() < 1e-6);
    assert!((v("I(V1)") + 10.0 / 3.0e3).abs() < 1e-9);
    assert!((v("I(R1)") - 10.0 / 3.0e3).abs() < 1e-9);
    assert!((v("I(R2)") - 10.0 / 3.0e3).abs() < 1e-9);
}

#[test]
fn rc_step_response() {
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "N1", "0", 5.0)).unwrap();
    c.add_element(resistor("R1", "N1", "N2", 1e3)).unwrap();
    c.add_element(capacitor("C1", "N2", "0", 1e-6)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut tran = TransientAnalysis::new(1e-5, 5e-3, true).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    assert_eq!(tran.time_points.len(), 501);
    let v_n2 = &tran.signals["V(N2)"];

    // tau = RC = 1ms: 5 * (1 - e^-1) = 3.1606 V
    let at_tau = v_n2[sample_at(&tran.time_points, 1e-3)];
    assert!(
        (at_tau - 3.1606).abs() < 0.05,
        "V(N2) at tau = {at_tau} (expected ~3.16)"
    );

    // 5 tau: essentially charged
    let at_end = v_n2[sample_at(&tran.time_points, 5e-3)];
    assert!(
        (at_end - 4.966).abs() < 0.01,
        "V(N2) at 5 tau = {at_end} (expected ~4.966)"
    );

    // Resistor current law at every sample: I(R1) = (V(N1) - V(N2)) / R
    let v_n1 = &tran.signals["V(N1)"];
    let i_r1 = &tran.signals["I(R1)"];
    for i in 0..tran.time_points.len() {
        let expected = (v_n1[i] - v_n2[i]) / 1e3;
        assert!(
            (i_r1[i] - expected).abs() <= 1e-9 * expected.abs().max(1e-12),
            "resistor current law violated at sample {i}"
        );
    }

    // Voltage-source constraint at every sample.
    for i in 0..tran.time_points.len() {
        assert!((v_n1[i] - 5.0).abs() < 5.0 * 1e-9);
    }
}

#[test]
fn rl_step_response() {
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "N1", "0", 10.0)).unwrap();
    c.add_element(resistor("R1", "N1", "N2", 100.0)).unwrap();
    c.add_element(Element::Inductor {
        name: "L1".into(),
        n1: "N2".into(),
        n2: "0".into(),
        inductance: 1e-3,
    })
    .unwrap();
    c.add_element(ground("0")).unwrap();

    let mut tran = TransientAnalysis::new(1e-6, 1e-4, true).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    let i_l1 = &tran.signals["I(L1)"];

    // tau = L/R = 10us: 0.1 * (1 - e^-1) = 0.0632 A
    let at_tau = i_l1[sample_at(&tran.time_points, 1e-5)];
    assert!(
        (at_tau - 0.0632).abs() < 0.005,
        "I(L1) at tau = {at_tau} (expected ~0.0632)"
    );

    // 10 tau: steady state V/R = 0.1 A
    let at_end = *i_l1.last().unwrap();
    assert!(
        (at_end - 0.1).abs() < 1e-3,
        "I(L1) steady state = {at_end} (expected ~0.1)"
    );

    // The inductor and its series resistor carry the same current.
    let i_r1 = &tran.signals["I(R1)"];
    for i in 1..tran.time_points.len() {
        assert!(
            (i_l1[i] - i_r1[i]).abs() < 1e-6,
            "KCL at N2 violated at sample {i}: I(L1)={}, I(R1)={}",
            i_l1[i],
            i_r1[i]
        );
    }
}

#[test]
fn pulse_through_rc() {
    let mut c = Circuit::new();
    c.add_element(Element::PulseSource {
        name: "V1".into(),
        n1: "N1".into(),
        n2: "0".into(),
        wave: PulseWave {
            v1: 0.0,
            v2: 5.0,
            td: 0.0,
            tr: 1e-6,
            tf: 1e-6,
            pw: 1e-3,
            per: 2e-3,
        },
    })
    .unwrap();
    c.add_element(resistor("R1", "N1", "N2", 1e3)).unwrap();
    c.add_element(capacitor("C1", "N2", "0", 1e-6)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut tran = TransientAnalysis::new(1e-5, 5e-3, true).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    let v_src = &tran.signals["V(N1)"];
    let v_cap = &tran.signals["V(N2)"];

    // The source reaches the pulsed level during the first pulse.
    let peak = v_src[sample_at(&tran.time_points, 0.5e-3)];
    assert!((peak - 5.0).abs() < 1e-6, "pulse level {peak}");

    // Capacitor charges for one pulse width (= one time constant)...
    let charged = v_cap[sample_at(&tran.time_points, 1e-3)];
    assert!(
        (charged - 3.16).abs() < 0.1,
        "V(N2) after first pulse = {charged}"
    );
    // ...then decays toward zero during the off interval.
    let decayed = v_cap[sample_at(&tran.time_points, 2e-3)];
    assert!(
        (decayed - 1.17).abs() < 0.1,
        "V(N2) after off interval = {decayed}"
    );
    assert!(decayed < charged);

    // Rising edges of the source signal across the whole run.
    let mut rising = 0;
    for i in 1..v_src.len() {
        if v_src[i - 1] < 2.5 && v_src[i] >= 2.5 {
            rising += 1;
        }
    }
    assert!(rising >= 2, "expected repeated pulses, saw {rising} rising edges");
}

#[test]
fn ac_sweep_rc_low_pass() {
    let mut c = Circuit::new();
    c.add_element(Element::AcSource {
        name: "V1".into(),
        n1: "N1".into(),
        n2: "0".into(),
        magnitude: 1.0,
        phase_deg: 0.0,
        frequency: 1e3,
    })
    .unwrap();
    c.add_element(resistor("R1", "N1", "N2", 1e3)).unwrap();
    c.add_element(capacitor("C1", "N2", "0", 1e-6)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut sweep = AcSweepAnalysis::new("V1", 1.0, 1e5, 50, AcSweepType::Dec).unwrap();
    sweep.run(&c).unwrap();

    assert_eq!(sweep.frequency_points.len(), 50);
    assert_eq!(sweep.signals["V(N2)"].len(), 50);

    // Corner frequency fc = 1/(2*pi*RC) = 159.15 Hz: |H| = 1/sqrt(2).
    // Interpolate the magnitude between the two neighboring grid points.
    let fc = 1.0 / (2.0 * PI * 1e3 * 1e-6);
    let mags: Vec<f64> = sweep.signals["V(N2)"].iter().map(|z| z.norm()).collect();
    let hi = sweep
        .frequency_points
        .iter()
        .position(|&f| f >= fc)
        .expect("corner inside sweep range");
    let lo = hi - 1;
    let (f0, f1) = (sweep.frequency_points[lo], sweep.frequency_points[hi]);
    let frac = (fc.ln() - f0.ln()) / (f1.ln() - f0.ln());
    let mag_fc = mags[lo] + frac * (mags[hi] - mags[lo]);

    let target = 1.0 / 2.0_f64.sqrt();
    assert!(
        (mag_fc - target).abs() / target < 0.03,
        "|V(N2)| at corner = {mag_fc} (expected {target} +- 3%)"
    );

    // Passband flat, stopband rolling off.
    assert!(mags[0] > 0.99);
    assert!(*mags.last().unwrap() < 0.01);
}

#[test]
fn dc_sweep_divider() {
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "N1", "0", 0.0)).unwrap();
    c.add_element(resistor("R1", "N1", "N2", 1e3)).unwrap();
    c.add_element(resistor("R2", "N2", "0", 1e3)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut sweep = DcSweepAnalysis::new("V1", 0.0, 10.0, 0.5).unwrap();
    sweep.run(&mut c, &GaussianElimination).unwrap();

    assert_eq!(sweep.sweep_values.len(), 21);
    for (i, &v) in sweep.sweep_values.iter().enumerate() {
        let mid = sweep.signals["V(N2)"][i];
        assert!(
            (mid - 0.5 * v).abs() < 1e-6,
            "V(N2) at V1={v}: {mid}"
        );
    }
}

#[test]
fn vccs_satisfies_kcl() {
    // G1 drives gm * V(in) out of node "out"; with a 1k load the output
    // settles at -gm * R * V(in).
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "in", "0", 2.0)).unwrap();
    c.add_element(resistor("R1", "in", "0", 1e3)).unwrap();
    c.add_element(Element::Vccs {
        name: "G1".into(),
        n1: "out".into(),
        n2: "0".into(),
        cn1: "in".into(),
        cn2: "0".into(),
        gm: 1e-3,
    })
    .unwrap();
    c.add_element(resistor("R2", "out", "0", 1e3)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut tran = TransientAnalysis::new(1e-6, 0.0, false).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    let v_out = tran.signals["V(out)"][0];
    assert!(
        (v_out + 2.0).abs() < 1e-6,
        "V(out) = {v_out} (expected -2.0)"
    );
    // KCL at out: the load current equals the injected gm * V(in).
    let i_r2 = tran.signals["I(R2)"][0];
    assert!((i_r2 + 1e-3 * 2.0).abs() < 1e-9);
}

#[test]
fn diode_operating_point_is_self_consistent() {
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "N1", "0", 0.7)).unwrap();
    c.add_element(resistor("R1", "N1", "N2", 1e3)).unwrap();
    c.add_element(Element::Diode {
        name: "D1".into(),
        n1: "N2".into(),
        n2: "0".into(),
        model: DiodeModel::new("default"),
    })
    .unwrap();
    c.add_element(ground("0")).unwrap();

    let mut tran = TransientAnalysis::new(1e-6, 0.0, false).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    let vd = tran.signals["V(N2)"][0];
    assert!(vd > 0.4 && vd < 0.6, "diode forward voltage {vd}");

    // The resistor current must equal the Shockley current at Vd.
    let i_r = tran.signals["I(R1)"][0];
    let i_d = 1e-12 * ((vd / 0.026).exp() - 1.0);
    assert!(
        (i_r - i_d).abs() / i_d < 0.01,
        "branch current {i_r} vs Shockley {i_d}"
    );
}

#[test]
fn vcvs_amplifies_control_voltage() {
    // E1 copies 2x the divider midpoint onto an otherwise floating node.
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "in", "0", 3.0)).unwrap();
    c.add_element(resistor("R1", "in", "mid", 1e3)).unwrap();
    c.add_element(resistor("R2", "mid", "0", 1e3)).unwrap();
    c.add_element(Element::Vcvs {
        name: "E1".into(),
        n1: "out".into(),
        n2: "0".into(),
        cn1: "mid".into(),
        cn2: "0".into(),
        gain: 2.0,
    })
    .unwrap();
    c.add_element(resistor("R3", "out", "0", 1e3)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut tran = TransientAnalysis::new(1e-6, 0.0, false).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    assert!((tran.signals["V(mid)"][0] - 1.5).abs() < 1e-6);
    assert!((tran.signals["V(out)"][0] - 3.0).abs() < 1e-6);
    assert!(tran.signals.contains_key("I(E1)"));
}

#[test]
fn cccs_mirrors_branch_current() {
    // F1 injects 2x the V1 branch current into a 1k load.
    // I(V1) = -1 mA (1V across 1k), so the load sees -2 mA pulled out.
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "a", "0", 1.0)).unwrap();
    c.add_element(resistor("R1", "a", "0", 1e3)).unwrap();
    c.add_element(Element::Cccs {
        name: "F1".into(),
        n1: "b".into(),
        n2: "0".into(),
        control_branch: "V1".into(),
        gain: 2.0,
    })
    .unwrap();
    c.add_element(resistor("R2", "b", "0", 1e3)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut tran = TransientAnalysis::new(1e-6, 0.0, false).unwrap();
    tran.run(&mut c, &GaussianElimination).unwrap();

    let i_v1 = tran.signals["I(V1)"][0];
    assert!((i_v1 + 1e-3).abs() < 1e-9);
    let v_b = tran.signals["V(b)"][0];
    assert!((v_b - 2.0).abs() < 1e-6, "V(b) = {v_b}");
}

#[test]
fn sweep_truncates_on_singular_system() {
    // Two ideal voltage sources in parallel disagree for every value
    // except where they match; the loop of sources makes the system
    // singular, so the sweep must record nothing and still return Ok.
    let mut c = Circuit::new();
    c.add_element(vsource("V1", "a", "0", 1.0)).unwrap();
    c.add_element(vsource("V2", "a", "0", 2.0)).unwrap();
    c.add_element(resistor("R1", "a", "0", 1e3)).unwrap();
    c.add_element(ground("0")).unwrap();

    let mut sweep = DcSweepAnalysis::new("V1", 0.0, 1.0, 0.5).unwrap();
    sweep.run(&mut c, &GaussianElimination).unwrap();

    assert!(sweep.sweep_values.len() <= 1);
    for series in sweep.signals.values() {
        assert_eq!(series.len(), sweep.sweep_values.len());
    }
}
