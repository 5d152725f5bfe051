//! Owner motion, scenario presets and the simulation loop.

use std::f32::consts::TAU;

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use replication::{
    Body, Outbox, PlaybackState, StaticAuthority, SyncConfig, SyncMessage, TickContext,
    TickOutcome, TransformSync,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::link::{LinkConditions, SimLink};
use crate::report::{ScenarioReport, SerdeTransform};

/// Path the owner follows, as a function of time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Motion {
    Linear { speed: f32 },
    /// Circles the origin in the XZ plane, facing along the path.
    Circle { radius: f32, period: f32 },
    /// Moves for `moving` seconds, then stands still for `resting` seconds.
    StopAndGo { speed: f32, moving: f32, resting: f32 },
}

impl Motion {
    #[must_use]
    pub fn position_at(&self, time: f32) -> Vec3 {
        match *self {
            Self::Linear { speed } => Vec3::new(speed * time, 0.0, 0.0),
            Self::Circle { radius, period } => {
                let angle = TAU * time / period;
                Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
            }
            Self::StopAndGo {
                speed,
                moving,
                resting,
            } => {
                let cycle = moving + resting;
                let cycles = (time / cycle).floor();
                let within = (time - cycles * cycle).min(moving);
                Vec3::new(speed * (cycles * moving + within), 0.0, 0.0)
            }
        }
    }

    #[must_use]
    pub fn rotation_at(&self, time: f32) -> Quat {
        match *self {
            Self::Circle { period, .. } => Quat::from_rotation_y(-TAU * time / period),
            Self::Linear { .. } | Self::StopAndGo { .. } => Quat::IDENTITY,
        }
    }
}

/// One simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub ticks: u32,
    pub tick_rate: f32,
    pub seed: u64,
    pub motion: Motion,
    pub link: LinkConditions,
    /// Ticks skipped before errors are recorded.
    pub warmup_ticks: u32,
}

impl Scenario {
    #[must_use]
    pub fn new(name: &str, motion: Motion, link: LinkConditions) -> Self {
        Self {
            name: name.to_string(),
            ticks: 600,
            tick_rate: 60.0,
            seed: 1,
            motion,
            link,
            warmup_ticks: 30,
        }
    }

    #[must_use]
    pub fn with_ticks(mut self, ticks: u32) -> Self {
        self.ticks = ticks;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn delta(&self) -> f32 {
        1.0 / self.tick_rate
    }
}

/// Names accepted by [`preset`].
pub const PRESETS: [&str; 5] = ["perfect", "lossy", "jitter", "reorder", "stop_and_go"];

#[must_use]
pub fn preset(name: &str) -> Option<Scenario> {
    let circle = Motion::Circle {
        radius: 5.0,
        period: 4.0,
    };
    let scenario = match name {
        "perfect" => Scenario::new(name, Motion::Linear { speed: 4.0 }, LinkConditions::perfect()),
        "lossy" => Scenario::new(name, circle, LinkConditions::lossy(0.1)),
        "jitter" => Scenario::new(name, circle, LinkConditions::jittery(0.05, 0.04)),
        "reorder" => Scenario::new(name, circle, LinkConditions::reordering(0.2)),
        "stop_and_go" => Scenario::new(
            name,
            Motion::StopAndGo {
                speed: 2.0,
                moving: 1.0,
                resting: 2.5,
            },
            LinkConditions::lossy(0.05),
        ),
        _ => return None,
    };
    Some(scenario)
}

/// Runs a server-owned object and one observer over a simulated link.
pub fn run_scenario(scenario: &Scenario, config: &SyncConfig) -> Result<ScenarioReport> {
    let mut owner = TransformSync::new(
        config.clone(),
        StaticAuthority::server_owned(),
        Some(Body::default()),
    )
    .context("build owner")?;
    let mut observer = TransformSync::new(
        config.clone(),
        StaticAuthority::observer(),
        Some(Body::default()),
    )
    .context("build observer")?;
    let mut link = SimLink::new(scenario.link, scenario.seed);
    let mut report = ScenarioReport::new(scenario);
    let mut unused = Outbox::new();
    let delta = scenario.delta();

    for tick in 0..scenario.ticks {
        let now = tick as f32 * delta;
        let ctx = TickContext::new(now, delta);

        if let Some(body) = owner.target_mut() {
            body.position = scenario.motion.position_at(now);
            body.rotation = scenario.motion.rotation_at(now);
        }
        link.set_time(now);
        if let TickOutcome::Sent { bytes } = owner.tick(&ctx, &mut link) {
            report.record_packet(bytes);
            if let Some(body) = owner.target() {
                report.record_bincode(&SerdeTransform::new(now, body))?;
            }
        }

        for message in link.deliver(now) {
            if let SyncMessage::Transform(_) = &message {
                report.delivered += 1;
            }
            if let Err(err) = observer.handle_server_message(&message, now) {
                debug!(error = %err, "observer rejected message");
            }
        }

        observer.tick(&ctx, &mut unused);
        let state = observer.receiver().playback_state();
        report.count_state(state);

        if tick >= scenario.warmup_ticks && state != PlaybackState::NoData {
            let playback_time = observer.receiver().clock().owner_time(now, None)
                - config.interpolation_back_time;
            let expected = scenario.motion.position_at(playback_time.max(0.0));
            if let Some(body) = observer.target() {
                report.record_error(body.position.distance(expected));
            }
        }
    }

    report.finish(&link);
    info!(
        scenario = %scenario.name,
        sent = report.sent,
        dropped = report.dropped,
        mean_error = report.mean_error,
        "scenario finished"
    );
    Ok(report)
}
