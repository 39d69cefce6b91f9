//! Behavioral properties of the accumulation engine.

use glam::Vec3;
use stereo_flock::accumulator::Contribution;
use stereo_flock::engine::is_neighbor;
use stereo_flock::spawn::random_flock;
use stereo_flock::steering::Steering;
use stereo_flock::{
    AccumulationEngine, AgentStore, Boid, CancelToken, FlockConfig, LevelRadii, NeighborSearch,
    SpatialConfig,
};

fn config(search: NeighborSearch) -> FlockConfig {
    FlockConfig {
        search,
        ..FlockConfig::default()
    }
}

fn tick_once(config: &FlockConfig, boids: Vec<Boid>) -> Vec<Boid> {
    let store = AgentStore::new(boids).unwrap();
    let mut engine = AccumulationEngine::new(config).unwrap();
    engine.tick(&store, &CancelToken::new()).unwrap();
    store.to_vec()
}

#[test]
fn isolated_agents_keep_their_heading_exactly() {
    let heading = Vec3::new(0.3, -0.1, 0.7);
    let boids = vec![
        Boid::new(Vec3::new(-50.0, 0.0, 0.0), heading),
        Boid::new(Vec3::new(50.0, 0.0, 0.0), -heading),
        Boid::new(Vec3::new(0.0, 50.0, 0.0), Vec3::new(0.123_456, 0.0, 0.0)),
    ];

    for search in [NeighborSearch::Grid, NeighborSearch::BruteForce] {
        let config = config(search);
        let next = tick_once(&config, boids.clone());
        for (before, after) in boids.iter().zip(&next) {
            assert_eq!(before.heading, after.heading);
            // Position still integrates.
            assert_ne!(before.pos, after.pos);
        }
    }
}

#[test]
fn merged_lanes_match_a_direct_reduction() {
    let config = FlockConfig {
        agent_count: 200,
        seed: Some(11),
        spawn_extent: 6.0,
        flocks: 2,
        radii: LevelRadii {
            levels: 3,
            ..LevelRadii::default()
        },
        search: NeighborSearch::BruteForce,
        ..FlockConfig::default()
    };
    let boids = random_flock(&config);
    let mut engine = AccumulationEngine::new(&config).unwrap();
    let accs = engine.scan(&boids).to_vec();

    for (i, me) in boids.iter().enumerate() {
        let radius = config.radii.radius(me.level);
        let neighbors: Vec<&Boid> = boids
            .iter()
            .enumerate()
            .filter(|&(j, other)| j != i && is_neighbor(me, other, radius))
            .map(|(_, other)| other)
            .collect();

        let acc = &accs[i];
        assert_eq!(acc.count() as usize, neighbors.len());
        assert_eq!(acc.count(), acc.left.count + acc.right.count);

        match acc.merge() {
            None => assert!(neighbors.is_empty()),
            Some(merged) => {
                let n = neighbors.len() as f32;
                let mean_pos = neighbors.iter().map(|b| b.position()).sum::<Vec3>() / n;
                let mean_heading = neighbors.iter().map(|b| b.heading()).sum::<Vec3>() / n;
                assert!((merged.mean_pos - mean_pos).length() < 1e-3);
                assert!((merged.mean_heading - mean_heading).length() < 1e-4);
            }
        }
    }
}

#[test]
fn grid_and_brute_force_commit_the_same_frame() {
    let base = FlockConfig {
        agent_count: 150,
        seed: Some(5),
        spawn_extent: 12.0,
        ..FlockConfig::default()
    };
    let boids = random_flock(&base);

    let grid = tick_once(&config_with(&base, NeighborSearch::Grid), boids.clone());
    let brute = tick_once(&config_with(&base, NeighborSearch::BruteForce), boids);
    for (a, b) in grid.iter().zip(&brute) {
        assert!((a.position() - b.position()).length() < 1e-4);
        assert!((a.heading() - b.heading()).length() < 1e-4);
    }
}

fn config_with(base: &FlockConfig, search: NeighborSearch) -> FlockConfig {
    FlockConfig {
        search,
        ..base.clone()
    }
}

#[test]
fn disjoint_masks_do_not_interact() {
    let boids = vec![
        Boid::new(Vec3::ZERO, Vec3::X).with_mask(0b01),
        Boid::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Y).with_mask(0b10),
        Boid::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z).with_mask(0b11),
    ];
    let mut engine = AccumulationEngine::new(&config(NeighborSearch::BruteForce)).unwrap();
    let accs = engine.scan(&boids);

    // 0 and 1 only see agent 2, which shares a bit with both.
    assert_eq!(accs[0].count(), 1);
    assert_eq!(accs[1].count(), 1);
    assert_eq!(accs[2].count(), 2);
}

#[test]
fn inert_agents_are_invisible_and_frozen() {
    let inert = Boid::new(Vec3::new(0.5, 0.0, 0.0), Vec3::Y).with_mask(0);
    let boids = vec![Boid::new(Vec3::ZERO, Vec3::X), inert];

    let config = config(NeighborSearch::Grid);
    let mut engine = AccumulationEngine::new(&config).unwrap();
    let accs = engine.scan(&boids);
    assert_eq!(accs[0].count(), 0);
    assert_eq!(accs[1].count(), 0);

    let next = tick_once(&config, boids);
    assert_eq!(next[1], inert);
    assert_eq!(next[0].heading, [1.0, 0.0, 0.0]);
}

#[test]
fn radius_boundary_is_inclusive_per_level() {
    let config = FlockConfig {
        radii: LevelRadii {
            base: 4.0,
            falloff: 0.5,
            levels: 2,
            table: None,
        },
        search: NeighborSearch::Grid,
        ..FlockConfig::default()
    };
    assert_eq!(config.radii.radius(1), 2.0);

    // A level-1 agent perceives exactly 2.0 away but not beyond.
    let boids = vec![
        Boid::new(Vec3::ZERO, Vec3::X).with_level(1),
        Boid::new(Vec3::new(2.0, 0.0, 0.0), Vec3::X),
        Boid::new(Vec3::new(0.0, -2.001, 0.0), Vec3::X),
    ];
    let mut engine = AccumulationEngine::new(&config).unwrap();
    let accs = engine.scan(&boids).to_vec();
    assert_eq!(accs[0].count(), 1);
    assert_eq!(accs[0].merge().unwrap().mean_pos, Vec3::new(2.0, 0.0, 0.0));

    // The level-0 agent at (2, 0, 0) sees both others within 4.0.
    assert_eq!(accs[1].count(), 2);
}

#[test]
fn grid_matches_brute_force_at_exact_radius() {
    for step in 1..40 {
        let cell_size = step as f32 * 0.1;
        for cells in 1..=3 {
            let radius = cells as f32 * cell_size;
            let base = FlockConfig {
                radii: LevelRadii {
                    base: radius,
                    falloff: 1.0,
                    levels: 1,
                    table: None,
                },
                spatial: SpatialConfig::new(cell_size, 64),
                ..FlockConfig::default()
            };
            let grid_config = config_with(&base, NeighborSearch::Grid);
            let brute_config = config_with(&base, NeighborSearch::BruteForce);
            let mut grid = AccumulationEngine::new(&grid_config).unwrap();
            let mut brute = AccumulationEngine::new(&brute_config).unwrap();

            for i in 0..200 {
                let x0 = cell_size * (-8.0 + i as f32 * 0.0537);
                let pair = [
                    Boid::new(Vec3::new(x0, 0.0, 0.0), Vec3::X),
                    Boid::new(Vec3::new(x0 + radius, 0.0, 0.0), Vec3::X),
                ];
                let expected: Vec<u32> = brute.scan(&pair).iter().map(|a| a.count()).collect();
                let got: Vec<u32> = grid.scan(&pair).iter().map(|a| a.count()).collect();
                assert_eq!(got, expected, "cell_size {cell_size}, radius {radius}, x0 {x0}");
            }
        }
    }
}

#[test]
fn headings_never_exceed_the_limit() {
    let config = FlockConfig {
        agent_count: 128,
        seed: Some(3),
        spawn_extent: 3.0,
        max_heading: 0.6,
        ..FlockConfig::default()
    };
    let store = AgentStore::new(random_flock(&config)).unwrap();
    let mut engine = AccumulationEngine::new(&config).unwrap();
    let cancel = CancelToken::new();
    for _ in 0..20 {
        engine.tick(&store, &cancel).unwrap();
    }
    for boid in store.snapshot().iter() {
        assert!(boid.heading().length() <= config.max_heading + 1e-5);
        assert!(boid.is_finite());
    }
}

#[test]
fn non_finite_steering_is_sanitized() {
    let steering = Steering::from_config(&FlockConfig::default());
    let boid = Boid::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.2, 0.0, 0.0));
    let poisoned = Contribution {
        count: 1,
        mean_pos: Vec3::new(f32::NAN, 0.0, 0.0),
        mean_heading: Vec3::ZERO,
    };

    let out = steering.update(&boid, Some(&poisoned));
    assert!(out.sanitized);
    assert!(out.boid.is_finite());
    assert_eq!(out.boid.heading, boid.heading);
}
