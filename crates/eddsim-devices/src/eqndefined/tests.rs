use std::cell::RefCell;
use std::rc::Rc;

use eddsim_core::{AnalysisMode, IntegrationMethod, Integrator, MnaSystem, NodeId, Stamper};
use nalgebra::{dvector, DVector};

use super::*;

fn registry(equations: &[(&str, &str)]) -> RegistryHandle {
    let mut registry = EquationRegistry::new();
    for (name, source) in equations {
        registry.define(name, source).unwrap();
    }
    Rc::new(RefCell::new(registry))
}

/// Two-terminal device between node 1 and node 2.
fn one_branch(name: &str, equations: &[(&str, &str)]) -> EqnDefined {
    EqnDefined::new(name, vec![NodeId::new(1), NodeId::new(2)], registry(equations)).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    let tol = 1e-12 * expected.abs().max(1e-12);
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_rejects_odd_or_empty_terminals() {
    let odd = EqnDefined::new(
        "D1",
        vec![NodeId::new(1), NodeId::new(2), NodeId::new(3)],
        registry(&[]),
    );
    assert!(matches!(odd, Err(Error::InvalidParameter(_))));

    let empty = EqnDefined::new("D1", Vec::new(), registry(&[]));
    assert!(matches!(empty, Err(Error::InvalidParameter(_))));
}

#[test]
fn test_component_type() {
    let d1 = one_branch("D1", &[("I1", "V1")]);
    assert_eq!(d1.component_type(), ComponentType::EqnDefined);
    assert!(d1.component_type().is_variable_sized());
}

#[test]
fn test_compile_builds_all_partials() {
    let reg = registry(&[
        ("I1", "V1 / 1k + V2 / 2k"),
        ("I2", "V1 * V2 * 1m"),
        ("Q1", "1p * V1"),
        ("Q2", "1p * V2 + 1p * V1"),
    ]);
    let terminals = (1..=4).map(NodeId::new).collect();
    let mut d1 = EqnDefined::new("D1", terminals, reg.clone()).unwrap();
    d1.init_dc().unwrap();

    let model = d1.model().unwrap();
    assert_eq!(model.branches(), 2);
    for i in 0..2 {
        assert!(model.current(i).is_some());
        assert!(model.charge(i).is_some());
        for j in 0..2 {
            assert!(model.conductance(i, j).is_some());
            assert!(model.capacitance(i, j).is_some());
        }
    }

    let reg = reg.borrow();
    assert!(reg.find("D1.G12").is_some());
    assert!(reg.find("D1.C21").is_some());
    assert!(reg.find("D1.V2").is_some());
    // Canonical equations are left untouched.
    assert_eq!(reg.describe(reg.find("I1").unwrap()), "I1 = ((V1 / 1000) + (V2 / 2000))");
}

#[test]
fn test_scoped_equation_takes_precedence() {
    let reg = registry(&[("I1", "V1 / 1k"), ("D2.I1", "V1 / 2k")]);
    let mut d1 = EqnDefined::new("D1", vec![NodeId::new(1), NodeId::GROUND], reg.clone()).unwrap();
    let mut d2 = EqnDefined::new("D2", vec![NodeId::new(1), NodeId::GROUND], reg).unwrap();
    d1.init_dc().unwrap();
    d2.init_dc().unwrap();

    let solution = dvector![1.0];
    d1.save_operating_points(&solution).unwrap();
    d2.save_operating_points(&solution).unwrap();
    assert_close(d1.operating_point().jstat[(0, 0)], 1e-3);
    assert_close(d2.operating_point().jstat[(0, 0)], 5e-4);
}

#[test]
fn test_missing_equations_are_zero() {
    let mut d1 = one_branch("D1", &[]);
    d1.init_dc().unwrap();
    let model = d1.model().unwrap();
    assert!(model.current(0).is_none());
    assert!(model.conductance(0, 0).is_none());

    d1.calc_dc(&dvector![1.0, 0.0]).unwrap();
    assert!(d1.stamps().y().iter().all(|v| *v == 0.0));
    assert!(d1.stamps().i().iter().all(|v| *v == 0.0));
}

#[test]
fn test_invalid_equation_is_dropped() {
    let mut d1 = one_branch("D1", &[("I1", "frob(V1)"), ("Q1", "V9 * 1p")]);
    d1.init_dc().unwrap();
    let model = d1.model().unwrap();
    assert!(model.current(0).is_none());
    assert!(model.charge(0).is_none());
}

#[test]
fn test_dc_stamp_blocks() {
    // I = 1m * V^2, at V = 1.5: I = 2.25m, g = 3m, g·V = 4.5m.
    let mut d1 = one_branch("D1", &[("I1", "1m * V1^2")]);
    d1.init_dc().unwrap();
    d1.calc_dc(&dvector![2.0, 0.5]).unwrap();

    let y = d1.stamps().y();
    assert_close(y[(0, 0)], 3e-3);
    assert_close(y[(1, 1)], 3e-3);
    assert_close(y[(0, 1)], -3e-3);
    assert_close(y[(1, 0)], -3e-3);

    let i = d1.stamps().i();
    assert_close(i[0], -2.25e-3 + 4.5e-3);
    assert_close(i[1], 2.25e-3 - 4.5e-3);
}

#[test]
fn test_dc_stamp_negative_and_zero_conductance() {
    let mut neg = one_branch("D1", &[("I1", "-V1 / 1k")]);
    neg.init_dc().unwrap();
    neg.calc_dc(&dvector![1.0, 0.0]).unwrap();
    assert_close(neg.stamps().y()[(0, 0)], -1e-3);
    assert_close(neg.stamps().y()[(0, 1)], 1e-3);
    // Linear: the companion source cancels the current exactly.
    assert!(neg.stamps().i()[0].abs() < 1e-18);

    let mut constant = one_branch("D2", &[("I1", "5m")]);
    constant.init_dc().unwrap();
    constant.calc_dc(&dvector![1.0, 0.0]).unwrap();
    assert!(constant.stamps().y().iter().all(|v| *v == 0.0));
    assert_close(constant.stamps().i()[0], -5e-3);
    assert_close(constant.stamps().i()[1], 5e-3);
}

#[test]
fn test_calc_dc_is_idempotent() {
    let mut d1 = one_branch("D1", &[("I1", "1e-14 * (exp(V1 / 0.025) - 1)")]);
    d1.init_dc().unwrap();
    let solution = dvector![0.6, 0.0];

    d1.calc_dc(&solution).unwrap();
    let first = d1.stamps().clone();
    d1.calc_dc(&solution).unwrap();
    assert_eq!(d1.stamps().y(), first.y());
    assert_eq!(d1.stamps().i(), first.i());
}

#[test]
fn test_cross_branch_block() {
    // Branch 2 current controlled by branch 1 voltage: a transconductor.
    let reg = registry(&[("I1", "0"), ("I2", "2m * V1")]);
    let terminals = (1..=4).map(NodeId::new).collect();
    let mut d1 = EqnDefined::new("D1", terminals, reg).unwrap();
    d1.init_dc().unwrap();
    d1.calc_dc(&dvector![1.0, 0.0, 0.0, 0.0]).unwrap();

    let y = d1.stamps().y();
    assert_close(y[(2, 0)], 2e-3);
    assert_close(y[(3, 1)], 2e-3);
    assert_close(y[(2, 1)], -2e-3);
    assert_close(y[(3, 0)], -2e-3);
    assert_eq!(y[(0, 2)], 0.0);
}

#[test]
fn test_charge_chain_rule() {
    // Q1 = t·I1 with I1 = V1/1k gives C11 = t·G11.
    let mut d1 = one_branch("D1", &[("I1", "V1 / 1k"), ("Q1", "I1 * 1n")]);
    d1.init_dc().unwrap();
    d1.save_operating_points(&dvector![0.7, 0.0]).unwrap();

    let op = d1.operating_point();
    assert_close(op.jstat[(0, 0)], 1e-3);
    assert_close(op.jdyna[(0, 0)], 1e-12);
    assert_close(op.charges[0], 0.7e-12);
}

#[test]
fn test_charge_chain_rule_across_branches() {
    let reg = registry(&[
        ("I1", "V1 / 1k + V2 / 2k"),
        ("I2", "V1 * V2 * 1m"),
        ("Q1", "I1 * 1n"),
        ("Q2", "I1 * 1n + I2 * 2n + V2 * 1p"),
    ]);
    let terminals = (1..=4).map(NodeId::new).collect();
    let mut d1 = EqnDefined::new("D1", terminals, reg).unwrap();
    d1.init_dc().unwrap();
    d1.save_operating_points(&dvector![1.0, 0.0, 2.0, 0.0]).unwrap();

    let op = d1.operating_point();
    assert_close(op.jstat[(1, 0)], 2e-3);
    assert_close(op.jstat[(1, 1)], 1e-3);
    for j in 0..2 {
        assert_close(op.jdyna[(0, j)], 1e-9 * op.jstat[(0, j)]);
        let own = if j == 1 { 1e-12 } else { 0.0 };
        assert_close(
            op.jdyna[(1, j)],
            1e-9 * op.jstat[(0, j)] + 2e-9 * op.jstat[(1, j)] + own,
        );
    }
    assert_close(op.jdyna[(1, 0)], 5e-12);
    assert_close(op.jdyna[(1, 1)], 3.5e-12);
    assert_close(op.charges[1], 8e-12);
}

#[test]
fn test_admittance_matches_operating_point() {
    let mut d1 = one_branch("D1", &[("I1", "V1 / 100"), ("Q1", "1u * V1")]);
    d1.init_ac().unwrap();
    d1.save_operating_points(&dvector![1.0, 0.0]).unwrap();

    let dc = d1.build_admittance(0.0);
    assert_close(dc[(0, 0)].re, 1e-2);
    assert_eq!(dc[(0, 0)].im, 0.0);
    assert_close(dc[(0, 1)].re, -1e-2);

    let y1 = d1.build_admittance(1e3);
    let y2 = d1.build_admittance(2e3);
    assert_close(y1[(0, 0)].im, 2.0 * std::f64::consts::PI * 1e3 * 1e-6);
    assert_close(y2[(0, 0)].im, 2.0 * y1[(0, 0)].im);
    assert_close(y2[(1, 0)].im, -y2[(0, 0)].im);
    assert_close(y2[(0, 0)].re, y1[(0, 0)].re);

    d1.calc_ac(1e3);
    assert_eq!(d1.stamps().matrix_y(), &y1);
}

#[test]
fn test_series_resistor_sparameters() {
    let mut d1 = one_branch("D1", &[("I1", "V1 / 50")]);
    d1.init_sp().unwrap();
    d1.save_operating_points(&dvector![0.0, 0.0]).unwrap();
    d1.calc_sp(1e6, 50.0).unwrap();

    let s = d1.stamps().matrix_s().unwrap();
    assert!((s[(0, 0)].re - 1.0 / 3.0).abs() < 1e-12);
    assert!((s[(1, 0)].re - 2.0 / 3.0).abs() < 1e-12);
    assert!(s[(0, 1)].im.abs() < 1e-12);
}

#[test]
fn test_transient_companion() {
    // Linear 1µF charge, backward Euler with h = 1µs: g = 1, i = Δq/h.
    let mut d1 = one_branch("D1", &[("Q1", "1u * V1")]);
    d1.init_tr().unwrap();
    assert_eq!(d1.charge_states().len(), 1);
    d1.init_transient_state(&dvector![0.0, 0.0]).unwrap();

    let integrator = Integrator::new(IntegrationMethod::BackwardEuler, 1e-6);
    d1.calc_tr(&dvector![1.0, 0.0], &integrator).unwrap();

    let y = d1.stamps().y();
    assert_close(y[(0, 0)], 1.0);
    assert_close(y[(0, 1)], -1.0);
    // -dq/dt + g·v cancels for a linear charge starting from rest.
    assert!(d1.stamps().i()[0].abs() < 1e-12);
    assert_close(d1.charge_states()[0].i, 1.0);

    d1.accept_step();
    assert_close(d1.charge_states()[0].q_prev, 1e-6);
}

#[test]
fn test_missing_charge_in_transient_and_hb() {
    let mut d1 = one_branch("D1", &[("I1", "V1 / 1k")]);
    d1.init_tr().unwrap();
    d1.init_transient_state(&dvector![1.0, 0.0]).unwrap();
    let integrator = Integrator::new(IntegrationMethod::Trapezoidal, 1e-9);
    d1.calc_tr(&dvector![1.0, 0.0], &integrator).unwrap();
    assert_eq!(d1.operating_point().charges[0], 0.0);
    assert_eq!(d1.charge_states()[0].i, 0.0);
    assert_close(d1.stamps().y()[(0, 0)], 1e-3);

    d1.init_hb().unwrap();
    d1.calc_hb(&dvector![1.0, 0.0]).unwrap();
    let hb = d1.stamps().hb().unwrap();
    assert!(hb.q.iter().all(|q| *q == 0.0));
    assert!(hb.qv.iter().all(|q| *q == 0.0));
    assert!(hb.cv.iter().all(|q| *q == 0.0));
}

#[test]
fn test_hb_stamps() {
    // I = 1m·V², Q = 1n·V at V = 2: I = 4m, g = 4m, Q = 2n, C = 1n.
    let mut d1 = one_branch("D1", &[("I1", "1m * V1^2"), ("Q1", "1n * V1")]);
    d1.init_hb().unwrap();
    d1.calc_hb(&dvector![2.0, 0.0]).unwrap();

    let stamps = d1.stamps();
    // G·V goes to the HB vector, not the RHS.
    assert_close(stamps.i()[0], -4e-3);
    let hb = stamps.hb().unwrap();
    assert_close(hb.gv[0], 8e-3);
    assert_close(hb.gv[1], -8e-3);
    assert_close(hb.q[0], -2e-9);
    assert_close(hb.q[1], 2e-9);
    assert_close(hb.qv[(0, 0)], 1e-9);
    assert_close(hb.qv[(0, 1)], -1e-9);
    assert_close(hb.cv[0], 2e-9);
    assert_close(hb.cv[1], -2e-9);

    // Returning to DC clears the HB routing.
    d1.init_dc().unwrap();
    d1.calc_dc(&dvector![2.0, 0.0]).unwrap();
    assert_close(d1.stamps().i()[0], -4e-3 + 8e-3);
}

#[test]
fn test_stamper_scatters_into_global_system() {
    let mut d1 = EqnDefined::new(
        "D1",
        vec![NodeId::new(1), NodeId::GROUND],
        registry(&[("I1", "V1 / 1k")]),
    )
    .unwrap();
    Stamper::init(&mut d1, AnalysisMode::Dc).unwrap();

    let mut mna = MnaSystem::new(1, 0);
    let solution = DVector::zeros(1);
    Stamper::stamp_dc(&mut d1, &mut mna, &solution).unwrap();
    assert_close(mna.matrix()[(0, 0)], 1e-3);
    assert_eq!(mna.rhs()[0], 0.0);
}

#[test]
fn test_nested_instance_scope() {
    let mut d1 = EqnDefined::new(
        "X1.D5",
        vec![NodeId::new(1), NodeId::GROUND],
        registry(&[("I1", "V1 / 1k")]),
    )
    .unwrap();
    d1.init_dc().unwrap();
    assert_eq!(d1.variable_names().instance(), "D5");
    assert!(d1.registry.borrow().find("D5.G11").is_some());
}

#[test]
fn test_calc_compiles_lazily() {
    let mut d1 = one_branch("D1", &[("I1", "V1 / 1k")]);
    d1.calc_dc(&dvector![1.0, 0.0]).unwrap();
    assert!(d1.model().is_some());
    assert_close(d1.stamps().y()[(0, 0)], 1e-3);
    assert_close(d1.stamps().y()[(1, 0)], -1e-3);

    let mut d2 = one_branch("D2", &[("I1", "V1 / 1k"), ("Q1", "1n * V1")]);
    d2.save_operating_points(&dvector![1.0, 0.0]).unwrap();
    assert_close(d2.operating_point().charges[0], 1e-9);
}

#[test]
fn test_uncompiled_stamping_is_an_error() {
    let mut d1 = one_branch("D1", &[("I1", "V1 / 1k")]);
    assert!(matches!(d1.stamp_currents(), Err(Error::NotCompiled(_))));
    assert!(matches!(
        d1.capture_operating_point(),
        Err(Error::NotCompiled(_))
    ));
}

#[test]
fn test_transient_without_init_tr() {
    let mut d1 = one_branch("D1", &[("Q1", "1u * V1")]);
    d1.init_dc().unwrap();
    let integrator = Integrator::new(IntegrationMethod::BackwardEuler, 1e-6);
    d1.calc_tr(&dvector![1.0, 0.0], &integrator).unwrap();

    assert_eq!(d1.charge_states().len(), 1);
    assert_eq!(d1.charge_states()[0].i, 0.0);
    assert_close(d1.stamps().y()[(0, 0)], 1.0);
}

#[test]
fn test_hb_without_init_hb() {
    let mut d1 = one_branch("D1", &[("I1", "1m * V1"), ("Q1", "1n * V1")]);
    d1.init_dc().unwrap();
    d1.calc_hb(&dvector![2.0, 0.0]).unwrap();

    let hb = d1.stamps().hb().unwrap();
    assert_close(hb.q[1], 2e-9);
    assert_close(hb.gv[0], 2e-3);
}
