//! Several equation-defined devices sharing one registry.

use std::cell::RefCell;
use std::rc::Rc;

use eddsim_core::NodeId;
use eddsim_devices::{ComponentType, EqnDefined, EquationRegistry};
use nalgebra::dvector;

#[test]
fn canonical_equations_serve_every_instance() {
    let mut registry = EquationRegistry::new();
    registry.define("I1", "V1 / 1k").unwrap();
    registry.define("Q1", "2p * V1").unwrap();
    let registry = Rc::new(RefCell::new(registry));

    let mut devices: Vec<EqnDefined> = ["D1", "D2", "X1.D3"]
        .iter()
        .enumerate()
        .map(|(k, name)| {
            EqnDefined::new(
                *name,
                vec![NodeId::new(k as u32 + 1), NodeId::GROUND],
                registry.clone(),
            )
            .unwrap()
        })
        .collect();

    let solution = dvector![1.0, 2.0, 3.0];
    for d in &mut devices {
        d.init_dc().unwrap();
        d.save_operating_points(&solution).unwrap();
    }

    for (k, d) in devices.iter().enumerate() {
        let v = (k + 1) as f64;
        let op = d.operating_point();
        assert!((op.jstat[(0, 0)] - 1e-3).abs() < 1e-15);
        assert!((op.jdyna[(0, 0)] - 2e-12).abs() < 1e-24);
        assert!((op.charges[0] - 2e-12 * v).abs() < 1e-24);
        assert_eq!(d.component_type(), ComponentType::EqnDefined);
    }

    let registry = registry.borrow();
    for scope in ["D1", "D2", "D3"] {
        assert!(registry.find(&format!("{scope}.I1")).is_some());
        assert!(registry.find(&format!("{scope}.C11")).is_some());
    }
}

#[test]
fn compile_happens_once() {
    let mut registry = EquationRegistry::new();
    registry.define("I1", "V1 / 1k").unwrap();
    let registry = Rc::new(RefCell::new(registry));

    let mut d1 = EqnDefined::new("D1", vec![NodeId::new(1), NodeId::GROUND], registry.clone())
        .unwrap();
    d1.init_dc().unwrap();
    let after_first = registry.borrow().len();
    d1.init_ac().unwrap();
    d1.init_hb().unwrap();
    d1.init_sp().unwrap();
    assert_eq!(registry.borrow().len(), after_first);
}
