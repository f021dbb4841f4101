use std::{
    cell::RefCell,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    rc::Rc,
    time::Duration,
};

use berry_grove_core::{
    CollectState, CollectibleId, Event, EventKind, FlightOutcome, GroupId, NullScene, PlacedTarget,
};
use berry_grove_system_collectibles::{CollectibleSeed, Config as GroupConfig};
use berry_grove_world::{query, Grove, GroveConfig};
use glam::Vec3;

#[test]
fn replaying_the_same_script_yields_identical_history() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());

    let hits = first
        .events
        .iter()
        .filter(|record| matches!(record, Record::Event(Event::TargetHit)))
        .count();
    let misses = first
        .events
        .iter()
        .filter(|record| matches!(record, Record::Flight(FlightOutcome::Miss)))
        .count();
    assert_eq!(hits, 3);
    assert_eq!(misses, 1);
    assert!(first
        .final_states
        .iter()
        .all(|state| *state == CollectState::Ready));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Record {
    Event(Event),
    Flight(FlightOutcome),
    Regrown(usize),
}

#[derive(Debug, PartialEq, Eq)]
struct ReplayOutcome {
    events: Vec<Record>,
    final_states: Vec<CollectState>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.events.hash(&mut hasher);
        self.final_states.hash(&mut hasher);
        hasher.finish()
    }
}

fn replay() -> ReplayOutcome {
    let config = GroveConfig {
        pool_capacity: 3,
        fixed_step_seconds: 0.01,
        ..GroveConfig::default()
    };
    let mut grove = Grove::new(config, Rc::new(NullScene)).expect("valid config");
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in [EventKind::TargetHit, EventKind::ResourceCollected] {
        let sink = Rc::clone(&log);
        let _ = grove.channel().subscribe(kind, move |event| {
            sink.borrow_mut().push(Record::Event(*event));
        });
    }

    let tree = GroupId::new(1);
    let bush = GroupId::new(2);
    let _ = grove
        .add_group(
            GroupConfig::new(tree, Duration::from_secs(3)),
            (0..3).map(|id| CollectibleSeed::ready(CollectibleId::new(id))).collect(),
        )
        .expect("tree");
    let _ = grove
        .add_group(
            GroupConfig::new(bush, Duration::from_secs(2)),
            vec![CollectibleSeed::ready(CollectibleId::new(10))],
        )
        .expect("bush");

    let target = Rc::new(PlacedTarget::new(Vec3::new(4.0, 0.5, 9.0), 0.75));
    let frame = Duration::from_millis(50);

    for frame_index in 0..200_u32 {
        match frame_index {
            0 | 10 | 40 => {
                let _ = grove.fire(Vec3::ZERO, target.clone()).expect("idle actor");
            }
            5 => {
                let _ = grove.collect(tree, CollectibleId::new(0));
                let _ = grove.collect(tree, CollectibleId::new(2));
            }
            20 => {
                let _ = grove.collect(bush, CollectibleId::new(10));
            }
            60 => {
                target.relocate(Vec3::new(-10.0, 0.0, 2.0));
                let _ = grove.fire(Vec3::new(1.0, 0.0, 1.0), target.clone());
                target.relocate(Vec3::new(4.0, 0.5, 9.0));
            }
            _ => {}
        }

        let report = grove.tick(frame);
        let mut records = log.borrow_mut();
        records.extend(report.flights.iter().map(|flight| Record::Flight(flight.outcome)));
        if report.regrown > 0 {
            records.push(Record::Regrown(report.regrown));
        }
    }

    let final_states = query::groups(&grove)
        .flat_map(|group| group.entities().iter().map(|entity| entity.state()))
        .collect();
    let events = log.borrow().clone();
    ReplayOutcome {
        events,
        final_states,
    }
}
