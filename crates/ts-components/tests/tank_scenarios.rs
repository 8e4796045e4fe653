//! Scenario tests for the stratified tank.

use std::collections::HashMap;

use proptest::prelude::*;
use ts_components::ports::volume_to_cell;
use ts_components::{
    ConstantAmbient, FlowBoundary, InitialTemperature, NetworkPart, PortExtension, PortSpec,
    PortStorage, TesConfig, TesInit, ThermalPart, ThermalStorage,
};
use ts_core::units::{kgps, m, m3, w_per_mk};
use ts_core::{Tolerances, nearly_equal};
use ts_graph::{FlowResolver, Net, NetworkBuilder, Operation, SlotRef, SlotStore, assemble};

fn init(t: InitialTemperature, ambient: f64) -> TesInit {
    TesInit {
        insulation_thickness: Some(m(0.05)),
        insulation_lambda: Some(w_per_mk(0.04)),
        t_init: Some(t),
        ambient: Some(Box::new(ConstantAmbient(ambient))),
    }
}

fn tank(n: u32, t: InitialTemperature) -> ThermalStorage {
    let config = TesConfig::new(m3(1.0), n, m(1.0), m(0.005));
    let mut tank = ThermalStorage::new("tes", &config).unwrap();
    tank.initialize(init(t, 20.0)).unwrap();
    tank
}

#[test]
fn scenario_a_cooling_with_faster_caps() {
    let mut tes = tank(5, InitialTemperature::Uniform(60.0));
    let out = tes.step(1.0).unwrap();
    let d = &out.derivative;

    assert!(d.iter().all(|&x| x < 0.0), "derivatives {d:?}");
    for interior in &d[1..4] {
        assert!(d[0].abs() > interior.abs());
        assert!(d[4].abs() > interior.abs());
    }
    assert!(tes.diagnostics().heat_loss > 0.0);
}

#[test]
fn scenario_b_plug_flow_heats_top_first() {
    let mut tes = tank(5, InitialTemperature::Uniform(60.0));
    tes.set_port_flow("in", 2.0).unwrap();
    tes.set_port_flow("out", -2.0).unwrap();
    tes.set_port_temperature("in", 80.0).unwrap();

    let out = tes.step(1.0).unwrap();
    let d = &out.derivative;
    assert!(out.verdict.stable);
    assert!(d[0] > 0.0);
    for interior in &d[1..] {
        assert!(*interior <= 0.0);
        assert!(d[0] > 1000.0 * interior.abs());
    }
}

#[test]
fn scenario_c_exchange_flow_on_density_inversion() {
    // Cold (dense) water above warm water between cells 1 and 2.
    let mut tes = tank(
        5,
        InitialTemperature::Profile(vec![20.0, 20.0, 60.0, 60.0, 60.0]),
    );
    tes.step(1.0).unwrap();
    let flows = tes.flows().clone();
    let q = flows.buoyant[1];
    assert!(q > 0.0);
    assert_eq!(flows.from_below[1], q);
    assert_eq!(flows.from_above[2], q);
    assert_eq!(tes.diagnostics().max_buoyant_flow, q);
    assert_eq!(tes.diagnostics().suppressed_anomalies, 0);

    let mut stable = tank(
        5,
        InitialTemperature::Profile(vec![60.0, 60.0, 20.0, 20.0, 20.0]),
    );
    stable.step(1.0).unwrap();
    assert!(stable.flows().buoyant.iter().all(|&f| f == 0.0));
    assert_eq!(stable.diagnostics().max_buoyant_flow, 0.0);
}

#[test]
fn default_ports_follow_inflow_convention() {
    let tes = tank(10, InitialTemperature::Uniform(20.0));
    assert_eq!(tes.port_names(), vec!["in".to_string(), "out".to_string()]);
    assert_eq!(tes.ports().cell("out"), Some(9));
    assert_eq!(tes.port_storage(), PortStorage::Flat(10));
}

#[test]
fn volume_ports_on_a_ten_cell_tank() {
    let config = TesConfig::new(m3(1.0), 10, m(1.0), m(0.005)).with_ports(PortExtension::Ports(vec![
        ("boundary".into(), PortSpec::volume(0.3)),
        ("top".into(), PortSpec::volume(0.0)),
        ("bottom".into(), PortSpec::volume(1.0)),
    ]));
    let tes = ThermalStorage::new("tes", &config).unwrap();
    assert_eq!(tes.ports().cell("boundary"), Some(3));
    assert_eq!(tes.ports().cell("top"), Some(0));
    assert_eq!(tes.ports().cell("bottom"), Some(9));
    // "top" shares cell 0 with "in", "bottom" shares cell 9 with "out".
    assert_eq!(tes.port_storage(), PortStorage::Stacked { rows: 2, cols: 10 });
}

#[test]
fn out_of_range_ports_are_validation_errors() {
    for spec in [PortSpec::volume(1.5), PortSpec::index(10), PortSpec::index(-3)] {
        let config = TesConfig::new(m3(1.0), 10, m(1.0), m(0.005))
            .with_ports(PortExtension::Ports(vec![("bad".into(), spec)]));
        assert!(matches!(
            ThermalStorage::new("tes", &config),
            Err(ts_components::ComponentError::Validation { .. })
        ));
    }
}

#[test]
fn reset_is_idempotent() {
    let profile = vec![70.0, 60.0, 50.0, 40.0, 30.0];
    let mut tes = tank(5, InitialTemperature::Profile(profile.clone()));
    tes.set_port_flow("in", 1.0).unwrap();
    tes.set_port_flow("out", -1.0).unwrap();
    let out = tes.step(5.0).unwrap();
    tes.commit(5.0, &out.derivative);
    assert_ne!(tes.temperature(), profile.as_slice());

    tes.reset_to_initial().unwrap();
    let once = tes.temperature().to_vec();
    tes.reset_to_initial().unwrap();
    assert_eq!(tes.temperature(), once.as_slice());
    assert_eq!(once, profile);
    assert!(tes.io_flow().iter().all(|&f| f == 0.0));
}

#[test]
fn stability_verdicts_are_deterministic() {
    let run = || {
        let mut tes = tank(20, InitialTemperature::Uniform(50.0));
        tes.set_port_flow("in", 30.0).unwrap();
        tes.set_port_flow("out", -30.0).unwrap();
        tes.step(60.0).unwrap().verdict
    };
    let first = run();
    assert!(!first.stable);
    assert_eq!(first, run());
}

#[test]
fn inner_diameter_regression() {
    let tes = tank(5, InitialTemperature::Uniform(20.0));
    assert_eq!(tes.geometry().inner_diameter, 1.0 - 0.005);
}

#[derive(Default)]
struct Slots(HashMap<SlotRef, f64>);

impl SlotStore for Slots {
    fn read(&self, slot: SlotRef) -> f64 {
        self.0.get(&slot).copied().unwrap_or(0.0)
    }
    fn write(&mut self, slot: SlotRef, value: f64) {
        self.0.insert(slot, value);
    }
}

#[test]
fn closure_balances_the_default_tank() {
    let mut builder = NetworkBuilder::new();
    let src = builder.add_part("supply", ["port"]);
    let tes_id = builder.add_part("tes", ["in", "out"]);
    let drain = builder.add_part("drain", ["port"]);
    builder.connect(src, "port", tes_id, "in");
    builder.connect(tes_id, "out", drain, "port");
    let network = builder.build().unwrap();

    let mut supply = FlowBoundary::source("supply", kgps(5.0), 80.0);
    let mut tes = tank(4, InitialTemperature::Uniform(20.0));
    let mut sink = FlowBoundary::free_end("drain", 20.0);
    let routines = {
        let mut parts: Vec<&mut dyn FlowResolver> =
            vec![&mut supply as &mut dyn FlowResolver, &mut tes, &mut sink];
        assemble(&network, &mut parts).unwrap()
    };

    let tank_ops: Vec<Operation> = routines
        .routines()
        .iter()
        .filter(|r| r.target.part == tes_id)
        .map(|r| r.operation)
        .collect();
    assert_eq!(tank_ops, vec![Operation::PassThrough, Operation::NegatedSum]);
    assert_eq!(tes.topology().solved(), ["in".to_string(), "out".to_string()]);
    assert_eq!(
        tes.topology().records()[1].to_string(),
        "tes:out <- negated-sum(tes:in) [subnet]"
    );
    assert_eq!(tes.topology().records()[0].net, Net::Flownet);

    let mut store = Slots::default();
    store.write(SlotRef::new(src, 0), 5.0);
    routines.evaluate(&mut store);
    let tank_in = store.read(SlotRef::new(tes_id, tes.ports().slot("in").unwrap()));
    let tank_out = store.read(SlotRef::new(tes_id, tes.ports().slot("out").unwrap()));
    assert_eq!(tank_in, 5.0);
    assert_eq!(tank_in + tank_out, 0.0);
    assert_eq!(store.read(SlotRef::new(drain, 0)), -5.0);
}

proptest! {
    #[test]
    fn geometry_closes(
        volume in 0.05f64..50.0,
        n in 1u32..200,
        d_o in 0.2f64..5.0,
        s in 0.001f64..0.05,
    ) {
        let config = TesConfig::new(m3(volume), n, m(d_o), m(s));
        let tes = ThermalStorage::new("tes", &config).unwrap();
        let g = tes.geometry();
        let tol = Tolerances::default();
        prop_assert!(nearly_equal(g.cross_section * g.length, volume, tol));
        prop_assert!(nearly_equal(g.grid_spacing * n as f64, g.length, tol));
        prop_assert_eq!(g.wall_heat_capacity.len(), n as usize);
        prop_assert_eq!(g.flow_length.len(), n as usize);
        prop_assert_eq!(g.dist_from_start.len(), n as usize);
    }

    #[test]
    fn volume_positions_land_in_the_nearest_cell(
        n in 1usize..100,
        fraction in 0.0f64..=1.0,
    ) {
        let cell_volume = 0.1;
        let volume = fraction * cell_volume * n as f64;
        let cell = volume_to_cell(volume, cell_volume, n);
        prop_assert!(cell < n);
        let centre = (cell as f64 + 0.5) * cell_volume;
        prop_assert!((volume - centre).abs() <= 0.5 * cell_volume + 1e-9);
    }
}
