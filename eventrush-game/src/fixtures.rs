//! Small hand-built games shared by the unit tests.
use std::sync::Arc;

use crate::definition::GameDefinition;
use crate::upgrade::{Boost, BoostLevel, Producer, ProductionProfile, Upgrade};

pub fn profile(produces: &[f64], points: f64) -> ProductionProfile {
    ProductionProfile {
        produces: produces.to_vec(),
        points,
    }
}

pub fn producer(
    name: &str,
    spawn_secs: f64,
    levels: Vec<ProductionProfile>,
    costs: Vec<Vec<f64>>,
) -> Producer {
    Producer {
        name: name.to_string(),
        spawn_secs,
        levels,
        alternate: None,
        costs,
        mode_labels: ["a".to_string(), "z".to_string()],
        needs: None,
    }
}

/// One free producer making 10 coins per minute, no time compression.
pub fn single_producer() -> Arc<GameDefinition> {
    let stall = producer("Stall", 60.0, vec![profile(&[10.0], 0.0)], vec![vec![0.0]]);
    Arc::new(
        GameDefinition::new("single", vec!["coins".into()], vec![Upgrade::Producer(stall)])
            .with_time_modifier(0.0),
    )
}

/// A coin stall, a useless boost and a tenfold point boost. Buying the
/// banner before the junk is strictly better.
pub fn banner_race() -> Arc<GameDefinition> {
    let stall = producer(
        "Stall",
        10.0,
        vec![profile(&[2.0], 1.0), profile(&[4.0], 2.0)],
        vec![vec![0.0], vec![20.0]],
    );
    let boost = |name: &str, cost: f64, point_multiplier: f64| {
        Upgrade::Boost(Boost {
            name: name.to_string(),
            levels: vec![BoostLevel {
                resource_bonus: Vec::new(),
                time_factor: 0.0,
                point_multiplier,
                cost: vec![cost],
            }],
        })
    };
    Arc::new(
        GameDefinition::new(
            "banner race",
            vec!["coins".into()],
            vec![
                Upgrade::Producer(stall),
                boost("Junk", 200.0, 1.0),
                boost("Banner", 100.0, 10.0),
            ],
        )
        .with_event_secs(2.0 * 60.0 * 60.0)
        .with_goal(1_000_000.0)
        .with_time_modifier(0.0),
    )
}

/// Four upgrades over two resources: a free coin stall, a sawmill with an
/// upkeep and a pause switch, a workshop needing wood, and a banner boost.
pub fn market() -> Arc<GameDefinition> {
    let stall = producer(
        "Stall",
        10.0,
        vec![
            profile(&[2.0, 0.0], 1.0),
            profile(&[4.0, 0.0], 2.0),
            profile(&[8.0, 0.0], 3.0),
        ],
        vec![vec![0.0, 0.0], vec![20.0, 0.0], vec![60.0, 0.0]],
    );
    let mut sawmill = producer(
        "Sawmill",
        20.0,
        vec![profile(&[-1.0, 2.0], 1.0), profile(&[-1.0, 6.0], 2.0)],
        vec![vec![30.0, 0.0], vec![80.0, 0.0]],
    );
    sawmill.alternate = Some(vec![profile(&[0.0, 0.0], 0.0); 2]);
    sawmill.needs = Some(0);
    let mut workshop = producer(
        "Workshop",
        30.0,
        vec![profile(&[6.0, 0.0], 5.0), profile(&[12.0, 0.0], 8.0)],
        vec![vec![50.0, 20.0], vec![100.0, 60.0]],
    );
    workshop.needs = Some(1);
    let banner = Boost {
        name: "Banner".to_string(),
        levels: vec![
            BoostLevel {
                resource_bonus: vec![1.0, 0.0],
                time_factor: 0.0,
                point_multiplier: 1.5,
                cost: vec![40.0, 10.0],
            },
            BoostLevel {
                resource_bonus: vec![2.0, 1.0],
                time_factor: -0.1,
                point_multiplier: 2.0,
                cost: vec![120.0, 30.0],
            },
        ],
    };
    Arc::new(
        GameDefinition::new(
            "market",
            vec!["coins".into(), "wood".into()],
            vec![
                Upgrade::Producer(stall),
                Upgrade::Producer(sawmill),
                Upgrade::Producer(workshop),
                Upgrade::Boost(banner),
            ],
        )
        .with_event_secs(2.0 * 60.0 * 60.0)
        .with_goal(5_000.0)
        .with_time_modifier(0.0),
    )
}
