#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grove state for Berry Grove.
//!
//! The [`Grove`] constructs the single event channel and deferred scheduler
//! and hands shared handles to the projectile pool and every collectible
//! group. Callers drive it with [`Grove::tick`], which advances the regrowth
//! clock by the full delta and integrates flights in fixed steps.

use std::{collections::BTreeMap, fmt, rc::Rc, time::Duration};

use berry_grove_core::{CollectibleId, GroupId, PoolError, Scene, Target};
use berry_grove_system_collectibles::{
    CollectibleGroup, CollectibleSeed, Config as GroupConfig,
};
use berry_grove_system_event_channel::EventChannel;
use berry_grove_system_projectiles::{FlightReport, ProjectilePool, Shot};
use berry_grove_system_scheduler::Scheduler;
use glam::Vec3;
use log::{debug, info};
use thiserror::Error;

mod config;

pub use config::{ConfigError, GroveConfig};

/// Reasons the grove rejects a request.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum WorldError {
    /// The grove configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A group with the same id already exists.
    #[error("group {} is already configured", .0.get())]
    DuplicateGroup(GroupId),
    /// A collectible id is already owned by another group.
    #[error("collectible {} already belongs to group {}", .0.get(), .1.get())]
    DuplicateCollectible(CollectibleId, GroupId),
}

/// Summary of a single [`Grove::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Number of fixed flight steps integrated during the tick.
    pub steps: u32,
    /// Number of regrowth continuations that ran during the tick.
    pub regrown: usize,
    /// Flights that ended during the tick, in completion order.
    pub flights: Vec<FlightReport>,
}

/// Represents the authoritative grove state.
pub struct Grove {
    fixed_step: Duration,
    accumulator: Duration,
    tick_index: u64,
    channel: Rc<EventChannel>,
    scheduler: Rc<Scheduler>,
    scene: Rc<dyn Scene>,
    pool: ProjectilePool,
    groups: BTreeMap<GroupId, Rc<CollectibleGroup>>,
}

impl Grove {
    /// Creates a grove with an empty set of groups.
    pub fn new(config: GroveConfig, scene: Rc<dyn Scene>) -> Result<Self, WorldError> {
        let fixed_step = config.validate()?;
        let channel = Rc::new(EventChannel::new());
        let scheduler = Rc::new(Scheduler::new());
        let pool = ProjectilePool::new(
            config.pool_capacity,
            config.projectile_config(),
            &channel,
            &scene,
        );
        info!(
            "grove ready: {} projectile(s), {}° launch angle, gravity {}",
            config.pool_capacity, config.launch_angle_degrees, config.gravity
        );

        Ok(Self {
            fixed_step,
            accumulator: Duration::ZERO,
            tick_index: 0,
            channel,
            scheduler,
            scene,
            pool,
            groups: BTreeMap::new(),
        })
    }

    /// Shared event channel; external collaborators subscribe here.
    #[must_use]
    pub fn channel(&self) -> &Rc<EventChannel> {
        &self.channel
    }

    /// Shared deferred scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    /// Configures a collectible group and registers it with the grove.
    pub fn add_group(
        &mut self,
        config: GroupConfig,
        seeds: Vec<CollectibleSeed>,
    ) -> Result<Rc<CollectibleGroup>, WorldError> {
        if self.groups.contains_key(&config.id()) {
            return Err(WorldError::DuplicateGroup(config.id()));
        }
        for seed in &seeds {
            if let Some(owner) = self.owner_of(seed.id()) {
                return Err(WorldError::DuplicateCollectible(seed.id(), owner));
            }
        }

        let group = CollectibleGroup::configure(
            config,
            seeds,
            &self.channel,
            &self.scheduler,
            &self.scene,
        );
        debug!(
            "group {} configured with {} collectible(s)",
            config.id().get(),
            group.entities().len()
        );
        let _ = self.groups.insert(config.id(), Rc::clone(&group));
        Ok(group)
    }

    /// Fires an idle projectile from `origin` towards `target`.
    pub fn fire(&mut self, origin: Vec3, target: Rc<dyn Target>) -> Result<Shot, PoolError> {
        self.pool.fire(origin, target)
    }

    /// A consumer touches the collectible `collectible` of group `group`.
    ///
    /// Returns `false` when the group or collectible is unknown or the
    /// collectible is not ready.
    pub fn collect(&self, group: GroupId, collectible: CollectibleId) -> bool {
        self.groups
            .get(&group)
            .and_then(|owner| owner.entity(collectible))
            .map_or(false, |entity| entity.try_consume())
    }

    /// Advances the grove by `dt` of simulated time.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        self.tick_index = self.tick_index.saturating_add(1);
        let mut report = TickReport {
            regrown: self.scheduler.advance(dt),
            ..TickReport::default()
        };

        self.accumulator = self.accumulator.saturating_add(dt);
        while self.accumulator >= self.fixed_step {
            self.accumulator -= self.fixed_step;
            self.pool.tick(self.fixed_step, &mut report.flights);
            report.steps += 1;
        }
        report
    }

    fn owner_of(&self, collectible: CollectibleId) -> Option<GroupId> {
        self.groups
            .values()
            .find(|group| group.entity(collectible).is_some())
            .map(|group| group.id())
    }
}

impl fmt::Debug for Grove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grove")
            .field("fixed_step", &self.fixed_step)
            .field("tick_index", &self.tick_index)
            .field("scheduler", &self.scheduler)
            .field("pool", &self.pool)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

/// Query functions that provide read-only access to the grove state.
pub mod query {
    use std::{rc::Rc, time::Duration};

    use berry_grove_core::GroupId;
    use berry_grove_system_collectibles::CollectibleGroup;
    use berry_grove_system_projectiles::ProjectilePool;

    use super::Grove;

    /// Provides read-only access to the projectile pool.
    #[must_use]
    pub fn projectile_pool(grove: &Grove) -> &ProjectilePool {
        &grove.pool
    }

    /// Looks up a configured group by id.
    #[must_use]
    pub fn group(grove: &Grove, id: GroupId) -> Option<&Rc<CollectibleGroup>> {
        grove.groups.get(&id)
    }

    /// Iterates configured groups in id order.
    pub fn groups(grove: &Grove) -> impl Iterator<Item = &Rc<CollectibleGroup>> {
        grove.groups.values()
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(grove: &Grove) -> u64 {
        grove.tick_index
    }

    /// Simulated time elapsed since the grove was created.
    #[must_use]
    pub fn elapsed(grove: &Grove) -> Duration {
        grove.scheduler.now()
    }

    /// Fixed step used to integrate flights.
    #[must_use]
    pub fn fixed_step(grove: &Grove) -> Duration {
        grove.fixed_step
    }
}
