//! Readers on other threads only ever observe whole ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use glam::Vec3;
use stereo_flock::spawn::random_flock;
use stereo_flock::{
    AccumulationEngine, AgentStore, Boid, CancelToken, FlockConfig, Simulation, StoreError,
};

const AGENTS: usize = 2048;

fn stamped(tick: u64) -> Vec<Boid> {
    vec![Boid::new(Vec3::splat(tick as f32), Vec3::X); AGENTS]
}

#[test]
fn concurrent_readers_never_see_a_torn_frame() {
    let store = Arc::new(AgentStore::new(stamped(0)).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = 0u64;
                while !done.load(Ordering::Acquire) {
                    let snap = store.snapshot();
                    let expected = snap.tick() as f32;
                    assert!(snap.iter().all(|b| b.pos[0] == expected));
                    seen = seen.max(snap.tick());
                }
                seen
            })
        })
        .collect();

    for tick in 1..=300u64 {
        store
            .commit(|_, next| {
                for (i, boid) in next.iter_mut().enumerate() {
                    *boid = Boid::new(Vec3::splat(tick as f32), Vec3::X);
                    if i % 512 == 0 {
                        thread::yield_now();
                    }
                }
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() <= 300);
    }
    assert_eq!(store.tick(), 300);
}

#[test]
fn failed_commit_keeps_the_committed_frame() {
    let store = AgentStore::new(stamped(0)).unwrap();
    let result: Result<((), u64), &str> = store.commit(|_, next| {
        next[0] = Boid::new(Vec3::splat(99.0), Vec3::Y);
        Err("abandoned")
    });
    assert!(result.is_err());
    assert_eq!(store.tick(), 0);
    assert_eq!(store.to_vec(), stamped(0));

    // The next successful commit overwrites the stale back frame.
    store.replace(&stamped(1)).unwrap();
    assert_eq!(store.to_vec(), stamped(1));
}

#[test]
fn replace_checks_length_and_values() {
    let store = AgentStore::new(stamped(0)).unwrap();
    assert_eq!(
        store.replace(&stamped(1)[..10]),
        Err(StoreError::LengthMismatch {
            expected: AGENTS,
            got: 10
        })
    );
    let mut bad = stamped(1);
    bad[7].heading[1] = f32::INFINITY;
    assert_eq!(store.replace(&bad), Err(StoreError::NonFinite { index: 7 }));
    assert_eq!(store.tick(), 0);
}

#[test]
fn simulation_readers_follow_ticks() {
    let mut sim = Simulation::builder()
        .with_agent_count(512)
        .with_seed(17)
        .build()
        .unwrap();
    let store = sim.store();
    let cancel: CancelToken = sim.cancel_token();

    let reader = thread::spawn(move || {
        let mut last = 0;
        for _ in 0..200 {
            let snap = store.snapshot();
            assert!(snap.tick() >= last);
            assert!(snap.iter().all(Boid::is_finite));
            last = snap.tick();
        }
        last
    });

    sim.run(25).unwrap();
    assert!(!cancel.is_cancelled());
    assert!(reader.join().unwrap() <= 25);
}

#[test]
fn concurrent_writers_each_get_their_own_tick() {
    let config = FlockConfig {
        agent_count: 256,
        seed: Some(29),
        ..FlockConfig::default()
    };
    let initial = random_flock(&config);
    let store = Arc::new(AgentStore::new(initial.clone()).unwrap());

    let replacer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            (0..100)
                .map(|_| store.replace(&initial).unwrap())
                .collect::<Vec<u64>>()
        })
    };

    let mut engine = AccumulationEngine::new(&config).unwrap();
    let cancel = CancelToken::new();
    let mut ticks: Vec<u64> = (0..100)
        .map(|_| engine.tick(&store, &cancel).unwrap().tick)
        .collect();
    ticks.extend(replacer.join().unwrap());

    ticks.sort_unstable();
    assert_eq!(ticks, (1..=200).collect::<Vec<u64>>());
    assert_eq!(store.tick(), 200);
}
