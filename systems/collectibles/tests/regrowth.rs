use std::{cell::RefCell, rc::Rc, time::Duration};

use berry_grove_core::{
    CollectState, CollectibleId, Event, EventKind, GroupId, RecordingScene, Scene, SceneNode,
};
use berry_grove_system_collectibles::{CollectibleGroup, CollectibleSeed, Config};
use berry_grove_system_event_channel::EventChannel;
use berry_grove_system_scheduler::Scheduler;

struct Grove {
    channel: Rc<EventChannel>,
    scheduler: Rc<Scheduler>,
    scene: Rc<RecordingScene>,
    published: Rc<RefCell<Vec<Event>>>,
}

impl Grove {
    fn new() -> Self {
        let channel = Rc::new(EventChannel::new());
        let published = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&published);
        let _ = channel.subscribe(EventKind::ResourceCollected, move |event| {
            sink.borrow_mut().push(*event);
        });
        Self {
            channel,
            scheduler: Rc::new(Scheduler::new()),
            scene: Rc::new(RecordingScene::new()),
            published,
        }
    }

    fn group(&self, id: u32, delay_secs: u64, seeds: Vec<CollectibleSeed>) -> Rc<CollectibleGroup> {
        let scene: Rc<dyn Scene> = self.scene.clone();
        CollectibleGroup::configure(
            Config::new(GroupId::new(id), Duration::from_secs(delay_secs)),
            seeds,
            &self.channel,
            &self.scheduler,
            &scene,
        )
    }
}

fn id(value: u32) -> CollectibleId {
    CollectibleId::new(value)
}

#[test]
fn collected_member_regrows_while_ready_member_is_untouched() {
    let grove = Grove::new();
    let group = grove.group(
        1,
        5,
        vec![CollectibleSeed::collected(id(0)), CollectibleSeed::ready(id(1))],
    );
    let a = group.entity(id(0)).expect("A");
    let b = group.entity(id(1)).expect("B");

    grove.channel.publish(Event::ResourceCollected {
        group: GroupId::new(1),
    });

    assert_eq!(a.state(), CollectState::Growing);
    assert_eq!(b.state(), CollectState::Ready);
    assert_eq!(grove.scheduler.pending_count(), 1);

    let _ = grove.scheduler.advance(Duration::from_millis(4_999));
    assert_eq!(a.state(), CollectState::Growing, "regrew before the delay");

    let _ = grove.scheduler.advance(Duration::from_millis(1));
    assert_eq!(a.state(), CollectState::Ready);
    assert_eq!(b.state(), CollectState::Ready);
    assert_eq!(grove.scene.is_active(SceneNode::Collectible(id(0))), Some(true));
}

#[test]
fn consuming_publishes_exactly_once() {
    let grove = Grove::new();
    let group = grove.group(4, 3, vec![CollectibleSeed::ready(id(0))]);
    let berry = group.entity(id(0)).expect("berry");

    assert!(berry.try_consume());
    assert!(!berry.try_consume());

    assert_eq!(
        *grove.published.borrow(),
        vec![Event::ResourceCollected {
            group: GroupId::new(4),
        }]
    );
    assert_eq!(grove.scene.is_active(SceneNode::Collectible(id(0))), Some(false));
}

#[test]
fn consuming_hands_entity_to_its_group_synchronously() {
    let grove = Grove::new();
    let group = grove.group(2, 1, vec![CollectibleSeed::ready(id(0))]);
    let berry = group.entity(id(0)).expect("berry");

    assert!(berry.try_consume());
    assert_eq!(berry.state(), CollectState::Growing);
    assert!(!berry.is_collectable());
    assert!(berry.is_growing());

    let _ = grove.scheduler.advance(Duration::from_secs(1));
    assert_eq!(berry.state(), CollectState::Ready);
    assert!(berry.try_consume(), "regrown berry can be collected again");
}

#[test]
fn foreign_group_events_change_nothing() {
    let grove = Grove::new();
    let group = grove.group(
        1,
        5,
        vec![CollectibleSeed::collected(id(0)), CollectibleSeed::ready(id(1))],
    );
    let calls_before = grove.scene.calls().len();

    grove.channel.publish(Event::ResourceCollected {
        group: GroupId::new(2),
    });

    assert_eq!(group.entity(id(0)).expect("A").state(), CollectState::Collected);
    assert_eq!(group.entity(id(1)).expect("B").state(), CollectState::Ready);
    assert_eq!(grove.scheduler.pending_count(), 0);
    assert_eq!(grove.scene.calls().len(), calls_before);
}

#[test]
fn groups_only_regrow_their_own_members() {
    let grove = Grove::new();
    let orchard = grove.group(1, 2, vec![CollectibleSeed::ready(id(0))]);
    let hedge = grove.group(2, 2, vec![CollectibleSeed::collected(id(10))]);

    assert!(orchard.entity(id(0)).expect("berry").try_consume());

    assert_eq!(orchard.entity(id(0)).expect("berry").state(), CollectState::Growing);
    assert_eq!(
        hedge.entity(id(10)).expect("hedge berry").state(),
        CollectState::Collected,
        "collection in group 1 must not regrow group 2"
    );
}

#[test]
fn members_regrow_on_independent_timers() {
    let grove = Grove::new();
    let group = grove.group(
        3,
        4,
        vec![CollectibleSeed::ready(id(0)), CollectibleSeed::ready(id(1))],
    );
    let first = group.entity(id(0)).expect("first");
    let second = group.entity(id(1)).expect("second");

    assert!(first.try_consume());
    let _ = grove.scheduler.advance(Duration::from_secs(2));
    assert!(second.try_consume());
    assert_eq!(grove.scheduler.pending_count(), 2);

    let _ = grove.scheduler.advance(Duration::from_secs(2));
    assert_eq!(first.state(), CollectState::Ready);
    assert_eq!(second.state(), CollectState::Growing);

    let _ = grove.scheduler.advance(Duration::from_secs(2));
    assert_eq!(second.state(), CollectState::Ready);
    assert_eq!(grove.scheduler.pending_count(), 0);
}
