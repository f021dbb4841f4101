#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collectible resources and the groups that regrow them.
//!
//! A [`CollectibleGroup`] owns a fixed set of [`CollectibleEntity`] values
//! that share its [`GroupId`]. Consuming an entity publishes
//! [`Event::ResourceCollected`]; every group hears the event, ignores foreign
//! ids, and schedules a delayed regrowth for each of its own entities that is
//! collected but not yet growing.

use std::{cell::Cell, fmt, rc::Rc, time::Duration};

use berry_grove_core::{
    CollectState, CollectibleId, Event, EventKind, GroupId, Scene, SceneNode,
};
use berry_grove_system_event_channel::{EventChannel, SubscriptionId};
use berry_grove_system_scheduler::Scheduler;
use log::debug;

/// Single collectible resource.
pub struct CollectibleEntity {
    id: CollectibleId,
    group: GroupId,
    state: Cell<CollectState>,
    channel: Rc<EventChannel>,
    scene: Rc<dyn Scene>,
}

impl CollectibleEntity {
    fn new(
        seed: CollectibleSeed,
        group: GroupId,
        channel: Rc<EventChannel>,
        scene: Rc<dyn Scene>,
    ) -> Self {
        let state = if seed.ready {
            CollectState::Ready
        } else {
            CollectState::Collected
        };
        scene.set_active(SceneNode::Collectible(seed.id), seed.ready);

        Self {
            id: seed.id,
            group,
            state: Cell::new(state),
            channel,
            scene,
        }
    }

    /// Identifier of the entity.
    #[must_use]
    pub const fn id(&self) -> CollectibleId {
        self.id
    }

    /// Group that owns the entity.
    #[must_use]
    pub const fn group(&self) -> GroupId {
        self.group
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CollectState {
        self.state.get()
    }

    /// Whether a consumer may currently collect the entity.
    #[must_use]
    pub fn is_collectable(&self) -> bool {
        self.state.get().is_collectable()
    }

    /// Whether a regrowth is outstanding for the entity.
    #[must_use]
    pub fn is_growing(&self) -> bool {
        self.state.get().is_growing()
    }

    /// Consumes the entity if it is ready.
    ///
    /// On success the entity leaves the scene and `ResourceCollected` is
    /// published for its group. Returns `false` without side effects when the
    /// entity is not ready.
    pub fn try_consume(&self) -> bool {
        if self.state.get() != CollectState::Ready {
            return false;
        }

        self.state.set(CollectState::Collected);
        self.scene
            .set_active(SceneNode::Collectible(self.id), false);
        debug!(
            "collectible {} of group {} consumed",
            self.id.get(),
            self.group.get()
        );
        self.channel
            .publish(Event::ResourceCollected { group: self.group });
        true
    }

    /// Marks a collected entity as growing. Returns `false` from any other
    /// state.
    pub fn begin_growth(&self) -> bool {
        if self.state.get() != CollectState::Collected {
            return false;
        }
        self.state.set(CollectState::Growing);
        true
    }

    /// Brings a growing entity back into the scene. Returns `false` from any
    /// other state.
    pub fn finish_growth(&self) -> bool {
        if self.state.get() != CollectState::Growing {
            return false;
        }
        self.state.set(CollectState::Ready);
        self.scene
            .set_active(SceneNode::Collectible(self.id), true);
        debug!(
            "collectible {} of group {} regrown",
            self.id.get(),
            self.group.get()
        );
        true
    }
}

impl fmt::Debug for CollectibleEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectibleEntity")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

/// Initial placement of an entity handed to [`CollectibleGroup::configure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollectibleSeed {
    id: CollectibleId,
    ready: bool,
}

impl CollectibleSeed {
    /// Entity that starts available for collection.
    #[must_use]
    pub const fn ready(id: CollectibleId) -> Self {
        Self { id, ready: true }
    }

    /// Entity that starts already collected and waits for its group.
    #[must_use]
    pub const fn collected(id: CollectibleId) -> Self {
        Self { id, ready: false }
    }

    /// Identifier of the seeded entity.
    #[must_use]
    pub const fn id(&self) -> CollectibleId {
        self.id
    }
}

/// Configuration parameters required to construct a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    id: GroupId,
    regrow_delay: Duration,
}

impl Config {
    /// Creates a new configuration for the group `id`.
    #[must_use]
    pub const fn new(id: GroupId, regrow_delay: Duration) -> Self {
        Self { id, regrow_delay }
    }

    /// Identifier the group filters events by.
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Delay between a collection and the regrowth of the entity.
    #[must_use]
    pub const fn regrow_delay(&self) -> Duration {
        self.regrow_delay
    }
}

/// Owner of a fixed set of collectibles sharing one group id.
pub struct CollectibleGroup {
    id: GroupId,
    regrow_delay: Duration,
    entities: Vec<Rc<CollectibleEntity>>,
    channel: Rc<EventChannel>,
    scheduler: Rc<Scheduler>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl CollectibleGroup {
    /// Builds the group's entities and subscribes the group to
    /// `ResourceCollected` events on `channel`.
    #[must_use]
    pub fn configure(
        config: Config,
        seeds: impl IntoIterator<Item = CollectibleSeed>,
        channel: &Rc<EventChannel>,
        scheduler: &Rc<Scheduler>,
        scene: &Rc<dyn Scene>,
    ) -> Rc<Self> {
        let entities = seeds
            .into_iter()
            .map(|seed| {
                Rc::new(CollectibleEntity::new(
                    seed,
                    config.id,
                    Rc::clone(channel),
                    Rc::clone(scene),
                ))
            })
            .collect();

        let group = Rc::new(Self {
            id: config.id,
            regrow_delay: config.regrow_delay,
            entities,
            channel: Rc::clone(channel),
            scheduler: Rc::clone(scheduler),
            subscription: Cell::new(None),
        });

        let listener = Rc::downgrade(&group);
        let subscription = channel.subscribe(EventKind::ResourceCollected, move |event| {
            if let (Some(group), Event::ResourceCollected { group: id }) = (listener.upgrade(), event)
            {
                let _ = group.on_resource_collected(*id);
            }
        });
        group.subscription.set(Some(subscription));
        group
    }

    /// Identifier shared by the group and its entities.
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Delay between a collection and the regrowth of the entity.
    #[must_use]
    pub const fn regrow_delay(&self) -> Duration {
        self.regrow_delay
    }

    /// Owned entities in configuration order.
    #[must_use]
    pub fn entities(&self) -> &[Rc<CollectibleEntity>] {
        &self.entities
    }

    /// Looks up an owned entity by id.
    #[must_use]
    pub fn entity(&self, id: CollectibleId) -> Option<&Rc<CollectibleEntity>> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    /// Reacts to a collection in `group`.
    ///
    /// Foreign group ids are ignored. Every owned entity that is collected
    /// and not already growing starts growing and gets a continuation that
    /// finishes its growth after the regrow delay. Returns the number of
    /// regrowths scheduled.
    pub fn on_resource_collected(&self, group: GroupId) -> usize {
        if group != self.id {
            return 0;
        }

        let mut scheduled = 0;
        for entity in &self.entities {
            if !entity.begin_growth() {
                continue;
            }

            let regrowing = Rc::clone(entity);
            let _ = self.scheduler.schedule(self.regrow_delay, move || {
                let _ = regrowing.finish_growth();
            });
            scheduled += 1;
        }

        if scheduled > 0 {
            debug!(
                "group {} scheduled {scheduled} regrowth(s) in {:?}",
                self.id.get(),
                self.regrow_delay
            );
        }
        scheduled
    }

    /// Stops listening for collection events. Returns `false` if the group
    /// was already detached.
    pub fn detach(&self) -> bool {
        match self.subscription.take() {
            Some(subscription) => self.channel.unsubscribe(subscription),
            None => false,
        }
    }
}

impl Drop for CollectibleGroup {
    fn drop(&mut self) {
        let _ = self.detach();
    }
}

impl fmt::Debug for CollectibleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectibleGroup")
            .field("id", &self.id)
            .field("regrow_delay", &self.regrow_delay)
            .field("entities", &self.entities)
            .finish_non_exhaustive()
    }
}
