//! Scripted grove sessions loaded from TOML.

use std::{cell::Cell, fmt, fs, path::Path, rc::Rc, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use berry_grove_core::{
    CollectState, CollectibleId, EventKind, FlightOutcome, GroupId, PlacedTarget, Scene,
};
use berry_grove_system_collectibles::{CollectibleSeed, Config as GroupConfig};
use berry_grove_world::{query, Grove, GroveConfig};
use glam::Vec3;
use log::{debug, info, warn};
use serde::Deserialize;

/// Session used when no scenario file is supplied.
const BUILT_IN: &str = r#"
duration_seconds = 10.0
starting_berries = 2

[[group]]
id = 1
regrow_seconds = 5.0
ready = [0, 1, 2]

[[group]]
id = 2
regrow_seconds = 3.0
ready = [10]
collected = [11]

[[target]]
position = [0.0, 0.0, 10.0]
size = 0.5

[[target]]
position = [6.0, 1.0, 6.0]
size = 1.0

[[shot]]
at_seconds = 0.0
origin = [0.0, 0.0, 0.0]
target = 0

[[shot]]
at_seconds = 0.5
origin = [0.0, 0.0, 0.0]
target = 1

[[shot]]
at_seconds = 1.0
origin = [2.0, 0.0, 0.0]
target = 0

[[shot]]
at_seconds = 1.5
origin = [0.0, 0.0, 0.0]
target = 1

[[collect]]
at_seconds = 1.0
group = 1
berry = 0

[[collect]]
at_seconds = 2.0
group = 1
berry = 0

[[collect]]
at_seconds = 2.5
group = 2
berry = 10

[[collect]]
at_seconds = 7.0
group = 1
berry = 0
"#;

const DEFAULT_DURATION_SECONDS: f32 = 10.0;
const DEFAULT_FRAME_SECONDS: f32 = 1.0 / 60.0;
const MAX_DURATION_SECONDS: f32 = 86_400.0;
const MAX_FRAMES: f32 = 10_000_000.0;

/// Scripted session: grove tuning, groups, targets and timed actions.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default)]
    grove: GroveConfig,
    #[serde(default = "default_duration")]
    duration_seconds: f32,
    #[serde(default = "default_frame")]
    frame_seconds: f32,
    #[serde(default)]
    starting_berries: u32,
    #[serde(default, rename = "group")]
    groups: Vec<GroupSpec>,
    #[serde(default, rename = "target")]
    targets: Vec<TargetSpec>,
    #[serde(default, rename = "shot")]
    shots: Vec<ShotSpec>,
    #[serde(default, rename = "collect")]
    collections: Vec<CollectSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupSpec {
    id: u32,
    regrow_seconds: f32,
    #[serde(default)]
    ready: Vec<u32>,
    #[serde(default)]
    collected: Vec<u32>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetSpec {
    position: Vec3,
    size: f32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShotSpec {
    at_seconds: f32,
    origin: Vec3,
    target: usize,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CollectSpec {
    at_seconds: f32,
    group: u32,
    berry: u32,
}

fn default_duration() -> f32 {
    DEFAULT_DURATION_SECONDS
}

fn default_frame() -> f32 {
    DEFAULT_FRAME_SECONDS
}

impl Scenario {
    /// Parses and validates a scenario document.
    pub(crate) fn parse(document: &str) -> Result<Self> {
        let mut scenario: Self = toml::from_str(document).context("failed to parse scenario")?;
        scenario.validate()?;
        scenario.shots.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
        scenario
            .collections
            .sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
        Ok(scenario)
    }

    /// Loads a scenario from disk.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let document = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&document).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Session that runs when no scenario file is supplied.
    pub(crate) fn built_in() -> Result<Self> {
        Self::parse(BUILT_IN).context("built-in scenario is invalid")
    }

    /// Replaces the session length.
    pub(crate) fn set_duration(&mut self, seconds: f32) -> Result<()> {
        check_length(seconds, self.frame_seconds)?;
        self.duration_seconds = seconds;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        check_length(self.duration_seconds, self.frame_seconds)?;
        for group in &self.groups {
            ensure!(
                group.regrow_seconds.is_finite() && group.regrow_seconds >= 0.0,
                "group {} has invalid regrow_seconds {}",
                group.id,
                group.regrow_seconds
            );
        }
        for target in &self.targets {
            ensure!(
                target.size.is_finite() && target.size >= 0.0,
                "target size must be non-negative, got {}",
                target.size
            );
        }
        for shot in &self.shots {
            if shot.target >= self.targets.len() {
                bail!(
                    "shot at {}s references target {} but only {} are defined",
                    shot.at_seconds,
                    shot.target,
                    self.targets.len()
                );
            }
        }
        let times = self
            .shots
            .iter()
            .map(|shot| shot.at_seconds)
            .chain(self.collections.iter().map(|collect| collect.at_seconds));
        for at in times {
            ensure!(at.is_finite() && at >= 0.0, "action time {at} is invalid");
        }
        Ok(())
    }

    /// Plays the session against a fresh grove rendering into `scene`.
    pub(crate) fn run(&self, scene: Rc<dyn Scene>) -> Result<RunSummary> {
        let mut grove = Grove::new(self.grove, scene).context("failed to build grove")?;
        for spec in &self.groups {
            let seeds = spec
                .ready
                .iter()
                .map(|&id| CollectibleSeed::ready(CollectibleId::new(id)))
                .chain(
                    spec.collected
                        .iter()
                        .map(|&id| CollectibleSeed::collected(CollectibleId::new(id))),
                )
                .collect();
            let delay = Duration::try_from_secs_f32(spec.regrow_seconds)
                .with_context(|| format!("group {} regrow delay is out of range", spec.id))?;
            let config = GroupConfig::new(GroupId::new(spec.id), delay);
            let _ = grove
                .add_group(config, seeds)
                .with_context(|| format!("failed to configure group {}", spec.id))?;
        }

        let targets: Vec<Rc<PlacedTarget>> = self
            .targets
            .iter()
            .map(|spec| Rc::new(PlacedTarget::new(spec.position, spec.size)))
            .collect();
        let hits = counter(&grove, EventKind::TargetHit);
        let berries = counter(&grove, EventKind::ResourceCollected);
        let held = counter(&grove, EventKind::ResourceCollected);
        held.set(self.starting_berries);

        let frame =
            Duration::try_from_secs_f32(self.frame_seconds).context("frame length is out of range")?;
        let frames = (self.duration_seconds / self.frame_seconds).ceil() as u32;
        let mut summary = RunSummary::default();
        let mut shots = self.shots.iter().peekable();
        let mut collections = self.collections.iter().peekable();

        for _ in 0..frames {
            let now = query::elapsed(&grove).as_secs_f32();
            while let Some(collect) = collections.next_if(|collect| collect.at_seconds <= now) {
                let group = GroupId::new(collect.group);
                let berry = CollectibleId::new(collect.berry);
                if grove.collect(group, berry) {
                    debug!(
                        "t={now:.2}s berry {} of group {} collected",
                        collect.berry, collect.group
                    );
                } else {
                    summary.collections_refused += 1;
                    debug!(
                        "t={now:.2}s berry {} of group {} is not collectable",
                        collect.berry, collect.group
                    );
                }
            }
            while let Some(shot) = shots.next_if(|shot| shot.at_seconds <= now) {
                if held.get() == 0 {
                    summary.shots_without_berries += 1;
                    debug!("t={now:.2}s no berry to throw");
                    continue;
                }
                match grove.fire(shot.origin, targets[shot.target].clone()) {
                    Ok(fired) => {
                        held.set(held.get() - 1);
                        summary.shots_fired += 1;
                        debug!("t={now:.2}s actor {} launched", fired.actor.get());
                        if let Some(outcome) = fired.resolved {
                            summary.record(outcome);
                        }
                    }
                    Err(error) => {
                        summary.shots_rejected += 1;
                        warn!("t={now:.2}s shot rejected: {error}");
                    }
                }
            }

            let report = grove.tick(frame);
            summary.regrown += report.regrown;
            for flight in &report.flights {
                summary.record(flight.outcome);
            }
        }

        summary.hits = hits.get();
        summary.berries_collected = berries.get();
        summary.berries_held = held.get();
        summary.in_flight = query::projectile_pool(&grove).in_flight_count();
        summary.ready_berries = query::groups(&grove)
            .flat_map(|group| group.entities().iter())
            .filter(|entity| entity.state() == CollectState::Ready)
            .count();
        summary.elapsed = query::elapsed(&grove);
        info!("session finished after {} tick(s)", query::tick_index(&grove));
        Ok(summary)
    }
}

fn check_length(duration_seconds: f32, frame_seconds: f32) -> Result<()> {
    ensure!(
        duration_seconds.is_finite()
            && duration_seconds > 0.0
            && duration_seconds <= MAX_DURATION_SECONDS,
        "duration must be between 0 and {MAX_DURATION_SECONDS} seconds, got {duration_seconds}"
    );
    ensure!(
        frame_seconds.is_finite() && frame_seconds > 0.0,
        "frame_seconds must be positive, got {frame_seconds}"
    );
    ensure!(
        duration_seconds / frame_seconds <= MAX_FRAMES,
        "{duration_seconds}s at {frame_seconds}s per frame exceeds {MAX_FRAMES} frames"
    );
    Ok(())
}

fn counter(grove: &Grove, kind: EventKind) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let observed = Rc::clone(&count);
    let _ = grove.channel().subscribe(kind, move |_| {
        observed.set(observed.get() + 1);
    });
    count
}

/// Totals gathered while a scenario runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) shots_fired: u32,
    pub(crate) shots_rejected: u32,
    pub(crate) shots_without_berries: u32,
    pub(crate) resolved: u32,
    pub(crate) misses: u32,
    pub(crate) in_flight: usize,
    pub(crate) hits: u32,
    pub(crate) berries_collected: u32,
    pub(crate) collections_refused: u32,
    pub(crate) berries_held: u32,
    pub(crate) regrown: usize,
    pub(crate) ready_berries: usize,
    pub(crate) elapsed: Duration,
}

impl RunSummary {
    fn record(&mut self, outcome: FlightOutcome) {
        self.resolved += 1;
        if outcome == FlightOutcome::Miss {
            self.misses += 1;
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "simulated {:.2}s", self.elapsed.as_secs_f32())?;
        writeln!(
            f,
            "shots: {} fired, {} rejected, {} without berries, {} still in flight",
            self.shots_fired, self.shots_rejected, self.shots_without_berries, self.in_flight
        )?;
        writeln!(
            f,
            "flights: {} resolved, {} hit, {} missed",
            self.resolved, self.hits, self.misses
        )?;
        writeln!(
            f,
            "berries: {} collected, {} refused, {} regrown, {} in hand",
            self.berries_collected, self.collections_refused, self.regrown, self.berries_held
        )?;
        write!(f, "ready berries: {}", self.ready_berries)
    }
}
