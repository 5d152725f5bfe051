use anyhow::{Context, Result};
use replication::{Body, PlaybackState};
use serde::Serialize;

use crate::link::{LinkConditions, SimLink};
use crate::scenario::{Motion, Scenario};

/// Results of one scenario, written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub ticks: u32,
    pub seed: u64,
    pub motion: Motion,
    pub link: LinkConditions,
    pub sent: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub bytes_total: u64,
    pub avg_packet_bytes: u64,
    pub p95_packet_bytes: u64,
    /// What the same sends would cost as bincode-serialized full transforms.
    pub bincode_bytes_total: u64,
    pub mean_error: f32,
    pub p95_error: f32,
    pub max_error: f32,
    pub ticks_interpolating: u32,
    pub ticks_extrapolating: u32,
    pub ticks_at_rest: u32,
    pub ticks_frozen: u32,
    #[serde(skip)]
    packet_sizes: Vec<u64>,
    #[serde(skip)]
    errors: Vec<f32>,
}

impl ScenarioReport {
    #[must_use]
    pub fn new(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            ticks: scenario.ticks,
            seed: scenario.seed,
            motion: scenario.motion,
            link: scenario.link,
            sent: 0,
            delivered: 0,
            dropped: 0,
            bytes_total: 0,
            avg_packet_bytes: 0,
            p95_packet_bytes: 0,
            bincode_bytes_total: 0,
            mean_error: 0.0,
            p95_error: 0.0,
            max_error: 0.0,
            ticks_interpolating: 0,
            ticks_extrapolating: 0,
            ticks_at_rest: 0,
            ticks_frozen: 0,
            packet_sizes: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_bincode(&mut self, transform: &SerdeTransform) -> Result<()> {
        let bytes = bincode::serialize(transform).context("bincode transform")?;
        self.bincode_bytes_total += bytes.len() as u64;
        Ok(())
    }

    pub fn record_packet(&mut self, len: usize) {
        self.packet_sizes.push(len as u64);
    }

    pub fn record_error(&mut self, error: f32) {
        self.errors.push(error);
    }

    pub fn count_state(&mut self, state: PlaybackState) {
        match state {
            PlaybackState::Interpolating => self.ticks_interpolating += 1,
            PlaybackState::Extrapolating => self.ticks_extrapolating += 1,
            PlaybackState::AtRestHold => self.ticks_at_rest += 1,
            PlaybackState::ExtrapolationExceeded => self.ticks_frozen += 1,
            PlaybackState::NoData => {}
        }
    }

    pub fn finish(&mut self, link: &SimLink) {
        self.sent = link.sent;
        self.dropped = link.dropped;
        self.bytes_total = link.bytes_sent;
        if !self.packet_sizes.is_empty() {
            self.avg_packet_bytes = self.bytes_total / self.packet_sizes.len() as u64;
            self.p95_packet_bytes = p95(&mut self.packet_sizes);
        }
        if !self.errors.is_empty() {
            let total: f32 = self.errors.iter().sum();
            self.mean_error = total / self.errors.len() as f32;
            self.errors.sort_unstable_by(f32::total_cmp);
            let idx = ((self.errors.len() as f64) * 0.95).ceil() as usize;
            self.p95_error = self.errors[idx.saturating_sub(1).min(self.errors.len() - 1)];
            self.max_error = self.errors[self.errors.len() - 1];
        }
    }

    /// Fails when a budget is exceeded.
    pub fn assert_budgets(
        &self,
        max_p95_error: Option<f32>,
        max_avg_bytes: Option<u64>,
    ) -> Result<()> {
        if let Some(max_p95_error) = max_p95_error {
            if self.p95_error > max_p95_error {
                anyhow::bail!(
                    "{}: p95 error {} exceeds budget {}",
                    self.name,
                    self.p95_error,
                    max_p95_error
                );
            }
        }
        if let Some(max_avg_bytes) = max_avg_bytes {
            if self.avg_packet_bytes > max_avg_bytes {
                anyhow::bail!(
                    "{}: avg packet bytes {} exceeds budget {}",
                    self.name,
                    self.avg_packet_bytes,
                    max_avg_bytes
                );
            }
        }
        Ok(())
    }
}

fn p95(values: &mut [u64]) -> u64 {
    values.sort_unstable();
    let idx = ((values.len() as f64) * 0.95).ceil() as usize;
    let idx = idx.saturating_sub(1).min(values.len() - 1);
    values[idx]
}

/// A full transform as a serde-based protocol would send it.
#[derive(Debug, Serialize)]
pub struct SerdeTransform {
    timestamp: f32,
    position: [f32; 3],
    rotation: [f32; 4],
    scale: [f32; 3],
    velocity: [f32; 3],
}

impl SerdeTransform {
    #[must_use]
    pub fn new(timestamp: f32, body: &Body) -> Self {
        Self {
            timestamp,
            position: body.position.to_array(),
            rotation: body.rotation.to_array(),
            scale: body.scale.to_array(),
            velocity: body.velocity.to_array(),
        }
    }
}
