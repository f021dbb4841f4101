#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pooled projectile actors flying arcing shots at targets.
//!
//! A [`ProjectilePool`] owns a fixed arena of [`ProjectileActor`] slots and a
//! free-list of idle slot indices. Firing claims an idle slot and launches it;
//! every fixed tick advances the in-flight actors. When a flight ends the
//! actor parks itself back on the pool's [`Dock`] and only then reports its
//! [`FlightOutcome`] and publishes [`Event::TargetHit`] on a hit.

use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

use berry_grove_core::{
    ActorId, Advanceable, Container, Event, FlightOutcome, LaunchError, PoolError, Scene,
    SceneNode, Target, DEFAULT_GRAVITY, DEFAULT_LAUNCH_ANGLE_DEGREES,
};
use berry_grove_system_event_channel::EventChannel;
use berry_grove_system_trajectory::{self as trajectory, FlightPlan};
use glam::{Quat, Vec3};
use log::{debug, warn};

/// Ballistic parameters shared by every actor in a pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    launch_angle_degrees: f32,
    gravity: f32,
}

impl Config {
    /// Creates a configuration using the provided launch angle and gravity.
    #[must_use]
    pub const fn new(launch_angle_degrees: f32, gravity: f32) -> Self {
        Self {
            launch_angle_degrees,
            gravity,
        }
    }

    /// Upward launch angle in degrees.
    #[must_use]
    pub const fn launch_angle_degrees(&self) -> f32 {
        self.launch_angle_degrees
    }

    /// Gravity magnitude applied during flight.
    #[must_use]
    pub const fn gravity(&self) -> f32 {
        self.gravity
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_LAUNCH_ANGLE_DEGREES, DEFAULT_GRAVITY)
    }
}

/// Activity of a projectile actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorState {
    /// Parked in the pool, ready to be claimed.
    Idle,
    /// Flying towards its target.
    InFlight,
}

/// Immediate result of a successful launch request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Launch {
    /// The actor is now in flight and must be ticked to completion.
    InFlight,
    /// The flight ended during launch and the actor is idle again.
    Resolved(FlightOutcome),
}

/// Free-list of idle actor ids shared between a pool and its actors.
#[derive(Clone, Debug, Default)]
pub struct Dock {
    idle: Rc<RefCell<Vec<ActorId>>>,
}

impl Dock {
    /// Creates an empty dock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the idle id with the lowest slot index.
    pub fn claim(&self) -> Option<ActorId> {
        let mut idle = self.idle.borrow_mut();
        let slot = idle
            .iter()
            .enumerate()
            .min_by_key(|&(_, id)| *id)
            .map(|(slot, _)| slot)?;
        Some(idle.swap_remove(slot))
    }

    /// Returns `id` to the idle set.
    pub fn park(&self, id: ActorId) {
        let mut idle = self.idle.borrow_mut();
        if !idle.contains(&id) {
            idle.push(id);
        }
    }

    fn withdraw(&self, id: ActorId) {
        self.idle.borrow_mut().retain(|idle| *idle != id);
    }

    /// Whether `id` is currently idle.
    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.idle.borrow().contains(&id)
    }

    /// Number of idle ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.idle.borrow().len()
    }

    /// Whether no id is idle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idle.borrow().is_empty()
    }
}

/// Single reusable projectile.
pub struct ProjectileActor {
    id: ActorId,
    state: ActorState,
    launch_angle_degrees: f32,
    gravity: f32,
    origin: Vec3,
    position: Vec3,
    facing: Quat,
    target: Option<Rc<dyn Target>>,
    plan: Option<FlightPlan>,
    elapsed: f32,
    dock: Dock,
    channel: Rc<EventChannel>,
    scene: Rc<dyn Scene>,
}

impl ProjectileActor {
    /// Creates an idle actor parked on `dock`.
    #[must_use]
    pub fn new(
        id: ActorId,
        config: Config,
        dock: Dock,
        channel: Rc<EventChannel>,
        scene: Rc<dyn Scene>,
    ) -> Self {
        let node = SceneNode::Projectile(id);
        scene.set_parent(node, Container::Pool);
        scene.set_active(node, false);
        dock.park(id);

        Self {
            id,
            state: ActorState::Idle,
            launch_angle_degrees: config.launch_angle_degrees,
            gravity: config.gravity,
            origin: Vec3::ZERO,
            position: Vec3::ZERO,
            facing: Quat::IDENTITY,
            target: None,
            plan: None,
            elapsed: 0.0,
            dock,
            channel,
            scene,
        }
    }

    /// Slot index of the actor inside its pool.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Current activity of the actor.
    #[must_use]
    pub const fn state(&self) -> ActorState {
        self.state
    }

    /// Position the current or most recent flight started from.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Current world-space position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Orientation facing the target at launch time.
    #[must_use]
    pub const fn facing(&self) -> Quat {
        self.facing
    }

    /// Flight plan of the active flight. `None` while idle.
    #[must_use]
    pub const fn plan(&self) -> Option<FlightPlan> {
        self.plan
    }

    /// Seconds elapsed since launch.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Starts a flight from `origin` towards `target`.
    ///
    /// A rejected trajectory resolves straight to [`FlightOutcome::Miss`] and a
    /// target at the origin to [`FlightOutcome::Hit`], whatever its size. Both
    /// leave the actor idle again.
    pub fn launch(&mut self, origin: Vec3, target: Rc<dyn Target>) -> Result<Launch, LaunchError> {
        if self.state != ActorState::Idle {
            return Err(LaunchError::Busy(self.id));
        }
        self.dock.withdraw(self.id);

        let destination = target.position();
        let node = SceneNode::Projectile(self.id);
        self.origin = origin;
        self.position = origin;
        self.facing = trajectory::facing(origin, destination);
        self.elapsed = 0.0;
        self.target = Some(target);
        self.state = ActorState::InFlight;
        self.scene.set_parent(node, Container::World);
        self.scene.set_position(node, origin);
        self.scene.set_active(node, true);

        match trajectory::solve(
            origin,
            destination,
            self.launch_angle_degrees,
            self.gravity,
        ) {
            Ok(plan) => {
                debug!(
                    "projectile {} launched towards {destination} ({:.3}s flight)",
                    self.id.get(),
                    plan.total_time
                );
                self.plan = Some(plan);
                if plan.distance == 0.0 {
                    return Ok(Launch::Resolved(self.finish(FlightOutcome::Hit)));
                }
                if plan.total_time <= 0.0 {
                    return Ok(Launch::Resolved(self.resolve()));
                }
                Ok(Launch::InFlight)
            }
            Err(error) => {
                debug!("projectile {} cannot launch: {error}", self.id.get());
                self.release();
                Ok(Launch::Resolved(FlightOutcome::Miss))
            }
        }
    }

    fn resolve(&mut self) -> FlightOutcome {
        let outcome = match &self.target {
            Some(target) if self.position.distance(target.position()) < target.size() => {
                FlightOutcome::Hit
            }
            _ => FlightOutcome::Miss,
        };
        self.finish(outcome)
    }

    fn finish(&mut self, outcome: FlightOutcome) -> FlightOutcome {
        debug!(
            "projectile {} resolved as {outcome:?} at {}",
            self.id.get(),
            self.position
        );

        self.release();
        if outcome == FlightOutcome::Hit {
            self.channel.publish(Event::TargetHit);
        }
        outcome
    }

    fn release(&mut self) {
        let node = SceneNode::Projectile(self.id);
        self.state = ActorState::Idle;
        self.plan = None;
        self.target = None;
        self.scene.set_active(node, false);
        self.scene.set_parent(node, Container::Pool);
        self.dock.park(self.id);
    }
}

impl Advanceable for ProjectileActor {
    type Outcome = Option<FlightOutcome>;

    fn tick(&mut self, dt: Duration) -> Option<FlightOutcome> {
        if self.state != ActorState::InFlight {
            return None;
        }
        let plan = self.plan?;

        if self.elapsed < plan.total_time {
            let step = dt.as_secs_f32();
            let rise = (plan.vertical_velocity - self.gravity * self.elapsed) * step;
            let advance = plan.horizontal_velocity * step;
            self.position += self.facing * Vec3::new(0.0, rise, advance);
            self.elapsed += step;
            self.scene
                .set_position(SceneNode::Projectile(self.id), self.position);
        }

        if self.elapsed >= plan.total_time {
            return Some(self.resolve());
        }
        None
    }
}

impl fmt::Debug for ProjectileActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectileActor")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("position", &self.position)
            .field("plan", &self.plan)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

/// Result of claiming and launching an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shot {
    /// Actor that was claimed for the shot.
    pub actor: ActorId,
    /// Outcome when the flight ended during launch.
    pub resolved: Option<FlightOutcome>,
}

/// Completed flight reported by [`ProjectilePool::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightReport {
    /// Actor that completed its flight.
    pub actor: ActorId,
    /// How the flight ended.
    pub outcome: FlightOutcome,
    /// Where the projectile was when the flight ended.
    pub position: Vec3,
}

/// Fixed-capacity arena of projectile actors.
#[derive(Debug)]
pub struct ProjectilePool {
    actors: Vec<ProjectileActor>,
    dock: Dock,
}

impl ProjectilePool {
    /// Creates `capacity` idle actors sharing the provided configuration.
    #[must_use]
    pub fn new(
        capacity: u32,
        config: Config,
        channel: &Rc<EventChannel>,
        scene: &Rc<dyn Scene>,
    ) -> Self {
        let dock = Dock::new();
        let actors: Vec<ProjectileActor> = (0..capacity)
            .map(|index| {
                ProjectileActor::new(
                    ActorId::new(index),
                    config,
                    dock.clone(),
                    Rc::clone(channel),
                    Rc::clone(scene),
                )
            })
            .collect();
        Self { actors, dock }
    }

    /// Number of actor slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.actors.len()
    }

    /// Number of actors available for firing.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.dock.len()
    }

    /// Shared free-list of idle actors.
    #[must_use]
    pub fn dock(&self) -> &Dock {
        &self.dock
    }

    /// Number of actors currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.actors.len() - self.dock.len()
    }

    /// Read-only access to an actor slot.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&ProjectileActor> {
        self.actors.get(slot_index(id))
    }

    /// Iterator over every actor slot in index order.
    pub fn actors(&self) -> impl Iterator<Item = &ProjectileActor> {
        self.actors.iter()
    }

    /// Claims an idle actor and launches it from `origin` towards `target`.
    ///
    /// The idle actor with the lowest slot index is claimed. Fails with
    /// [`PoolError::Exhausted`] without touching any actor when every slot is
    /// in flight.
    pub fn fire(&mut self, origin: Vec3, target: Rc<dyn Target>) -> Result<Shot, PoolError> {
        let Some(actor_id) = self.dock.claim() else {
            warn!("projectile pool exhausted ({} in flight)", self.actors.len());
            return Err(PoolError::Exhausted);
        };
        let Some(actor) = self.actors.get_mut(slot_index(actor_id)) else {
            self.dock.park(actor_id);
            return Err(PoolError::Exhausted);
        };
        let resolved = match actor.launch(origin, target) {
            Ok(Launch::InFlight) => None,
            Ok(Launch::Resolved(outcome)) => Some(outcome),
            Err(error) => return Err(error.into()),
        };
        Ok(Shot {
            actor: actor_id,
            resolved,
        })
    }

    /// Advances every in-flight actor by `dt`, appending completed flights
    /// to `out`. Completed actors park themselves before reporting.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<FlightReport>) {
        for actor in self
            .actors
            .iter_mut()
            .filter(|actor| actor.state() == ActorState::InFlight)
        {
            if let Some(outcome) = actor.tick(dt) {
                out.push(FlightReport {
                    actor: actor.id(),
                    outcome,
                    position: actor.position(),
                });
            }
        }
    }
}

fn slot_index(id: ActorId) -> usize {
    usize::try_from(id.get()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use berry_grove_core::{NullScene, PlacedTarget};

    fn actor() -> ProjectileActor {
        ProjectileActor::new(
            ActorId::new(0),
            Config::default(),
            Dock::new(),
            Rc::new(EventChannel::new()),
            Rc::new(NullScene),
        )
    }

    #[test]
    fn launching_busy_actor_is_rejected() {
        let mut actor = actor();
        let target: Rc<dyn Target> = Rc::new(PlacedTarget::new(Vec3::new(0.0, 0.0, 8.0), 1.0));

        assert_eq!(
            actor.launch(Vec3::ZERO, Rc::clone(&target)),
            Ok(Launch::InFlight)
        );
        let plan = actor.plan();
        assert_eq!(
            actor.launch(Vec3::ONE, target),
            Err(LaunchError::Busy(ActorId::new(0)))
        );
        assert_eq!(actor.plan(), plan, "rejected launch must not reset the flight");
        assert_eq!(actor.origin(), Vec3::ZERO);
    }

    #[test]
    fn pool_claims_lowest_idle_slot() {
        let channel = Rc::new(EventChannel::new());
        let scene: Rc<dyn Scene> = Rc::new(NullScene);
        let mut pool = ProjectilePool::new(3, Config::default(), &channel, &scene);
        let far = Rc::new(PlacedTarget::new(Vec3::new(0.0, 0.0, 30.0), 1.0));
        let near = Rc::new(PlacedTarget::new(Vec3::new(0.0, 0.0, 2.0), 1.0));

        assert_eq!(pool.fire(Vec3::ZERO, far).map(|shot| shot.actor), Ok(ActorId::new(0)));
        assert_eq!(pool.fire(Vec3::ZERO, near.clone()).map(|shot| shot.actor), Ok(ActorId::new(1)));

        let mut reports = Vec::new();
        while reports.is_empty() {
            pool.tick(Duration::from_millis(10), &mut reports);
        }
        assert_eq!(reports[0].actor, ActorId::new(1));
        assert_eq!(pool.fire(Vec3::ZERO, near).map(|shot| shot.actor), Ok(ActorId::new(1)));
    }

    #[test]
    fn dock_hands_out_lowest_id_once() {
        let dock = Dock::new();
        for id in [2, 0, 1] {
            dock.park(ActorId::new(id));
        }
        dock.park(ActorId::new(0));

        assert_eq!(dock.len(), 3);
        assert_eq!(dock.claim(), Some(ActorId::new(0)));
        assert!(!dock.contains(ActorId::new(0)));
        assert_eq!(dock.claim(), Some(ActorId::new(1)));
        assert_eq!(dock.claim(), Some(ActorId::new(2)));
        assert_eq!(dock.claim(), None);
        assert!(dock.is_empty());
    }

    #[test]
    fn direct_launch_leaves_the_dock_until_it_lands() {
        let mut actor = actor();
        let dock = actor.dock.clone();
        assert!(dock.contains(ActorId::new(0)));

        let target: Rc<dyn Target> = Rc::new(PlacedTarget::new(Vec3::new(0.0, 0.0, 3.0), 0.5));
        assert_eq!(actor.launch(Vec3::ZERO, target), Ok(Launch::InFlight));
        assert!(dock.is_empty());

        while actor.tick(Duration::from_millis(5)).is_none() {}
        assert!(dock.contains(ActorId::new(0)));
    }

    #[test]
    fn idle_actor_ignores_ticks() {
        let mut actor = actor();
        assert_eq!(actor.tick(Duration::from_millis(20)), None);
        assert_eq!(actor.position(), Vec3::ZERO);
        assert_eq!(actor.elapsed(), 0.0);
    }

    #[test]
    fn velocities_are_cleared_after_completion() {
        let mut actor = actor();
        let target: Rc<dyn Target> = Rc::new(PlacedTarget::new(Vec3::new(0.0, 0.0, 2.0), 0.5));
        assert_eq!(actor.launch(Vec3::ZERO, target), Ok(Launch::InFlight));

        let mut outcome = None;
        for _ in 0..1_000 {
            outcome = actor.tick(Duration::from_millis(5));
            if outcome.is_some() {
                break;
            }
        }

        assert_eq!(outcome, Some(FlightOutcome::Hit));
        assert_eq!(actor.state(), ActorState::Idle);
        assert_eq!(actor.plan(), None);
    }

    #[test]
    fn elapsed_never_exceeds_total_while_in_flight() {
        let mut actor = actor();
        let target: Rc<dyn Target> = Rc::new(PlacedTarget::new(Vec3::new(6.0, 1.0, 3.0), 1.0));
        assert_eq!(actor.launch(Vec3::ZERO, target), Ok(Launch::InFlight));
        let total = actor.plan().expect("in flight").total_time;

        while actor.tick(Duration::from_millis(16)).is_none() {
            assert_eq!(actor.state(), ActorState::InFlight);
            assert!(actor.elapsed() < total);
        }
        assert_eq!(actor.state(), ActorState::Idle);
    }
}
