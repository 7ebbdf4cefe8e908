use lavaflow_engine::{ParticleSnapshot, ParticleType, SimConfig, SimulationCore};

fn small_core() -> SimulationCore {
    SimulationCore::with_config(SimConfig {
        capacity: 32,
        world_size: 128.0,
        ..SimConfig::default()
    })
    .expect("valid config")
}

#[test]
fn level_json_has_flat_buffers() {
    let mut sim = small_core();
    sim.allocate(10.0, 20.0, ParticleType::Bio, 0.0, true);
    let json = sim.to_json().expect("serializable");

    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["prtPos"].as_array().map(Vec::len), Some(32 * 2));
    assert_eq!(value["prtVel"].as_array().map(Vec::len), Some(32 * 2));
    assert_eq!(value["prtAttr"].as_array().map(Vec::len), Some(32 * 5));
    assert_eq!(value["prtPos"][1].as_f64(), Some(20.0));
}

#[test]
fn level_json_round_trip() {
    let mut sim = small_core();
    sim.set_seed(11);
    for _ in 0..8 {
        sim.emit(64.0, 30.0, 4.0, ParticleType::Water, 0.0, true);
    }
    sim.emit(64.0, 100.0, 10.0, ParticleType::Solid, 0.0, false);
    sim.tick(1.0 / 60.0, -1000.0, -1000.0);

    let json = sim.to_json().expect("serializable");
    let mut loaded = small_core();
    let fit = loaded.load_json(&json).expect("loads");
    assert!(fit.is_exact());
    assert_eq!(loaded.snapshot(), sim.snapshot());
    assert_eq!(loaded.alive_count(), sim.alive_count());
}

#[test]
fn old_level_with_fewer_slots_is_padded() {
    let snapshot = ParticleSnapshot {
        prt_pos: vec![40.0, 40.0, 44.0, 40.0],
        prt_vel: vec![0.0; 4],
        prt_attr: vec![
            ParticleType::Lava.to_lane(), 0.0, 3.5, 6.0, 1.0,
            ParticleType::Water.to_lane(), 0.0, 3.2, 1.0, 1.0,
        ],
    };
    let mut sim = small_core();
    let fit = sim.load_snapshot(&snapshot);
    assert_eq!(fit.padded, (32 - 2) * (2 + 2 + 5));
    assert_eq!(fit.truncated, 0);
    assert_eq!(sim.count_by_type(), [1, 1, 0, 0, 0]);
}

#[test]
fn missing_keys_load_as_empty_level() {
    let mut sim = small_core();
    sim.allocate(10.0, 10.0, ParticleType::Water, 0.0, false);
    let fit = sim.load_json("{}").expect("defaults fill missing keys");
    assert_eq!(fit.padded, 32 * 9);
    assert_eq!(sim.alive_count(), 0);
}
