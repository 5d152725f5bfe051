#![allow(dead_code)]

use replication::{
    Body, Outbox, PlaybackState, StaticAuthority, SyncConfig, SyncMessage, TickContext,
    TickOutcome, TransformSync,
};

pub const DT: f32 = 1.0 / 60.0;

/// A server-owned object and one observing client joined by a perfect,
/// zero-latency link that can be cut.
pub struct Link {
    pub owner: TransformSync<Body>,
    pub remote: TransformSync<Body>,
    outbox: Outbox,
    pub cut: bool,
    pub sends: usize,
}

impl Link {
    pub fn new(config: SyncConfig, owner: Body, remote: Body) -> Self {
        Self {
            owner: TransformSync::new(config.clone(), StaticAuthority::server_owned(), Some(owner))
                .unwrap(),
            remote: TransformSync::new(config, StaticAuthority::observer(), Some(remote)).unwrap(),
            outbox: Outbox::new(),
            cut: false,
            sends: 0,
        }
    }

    pub fn owner_body(&mut self) -> &mut Body {
        self.owner.target_mut().unwrap()
    }

    pub fn remote_body(&mut self) -> &mut Body {
        self.remote.target_mut().unwrap()
    }

    pub fn teleport(&mut self, now: f32) {
        self.owner.teleport(now, &mut self.outbox).unwrap();
    }

    pub fn step(&mut self, now: f32) -> PlaybackState {
        let ctx = TickContext::new(now, DT);
        self.step_with(&ctx, &ctx)
    }

    /// Ticks the owner, delivers everything it broadcast, then ticks the remote.
    pub fn step_with(&mut self, owner: &TickContext, remote: &TickContext) -> PlaybackState {
        if let TickOutcome::Sent { .. } = self.owner.tick(owner, &mut self.outbox) {
            self.sends += 1;
        }
        self.deliver(remote.now);
        match self.remote.tick(remote, &mut Outbox::new()) {
            TickOutcome::Played(state) => state,
            other => panic!("remote did not play back: {other:?}"),
        }
    }

    fn deliver(&mut self, local_time: f32) {
        let messages: Vec<SyncMessage> = self.outbox.take_broadcasts();
        if self.cut {
            return;
        }
        for message in &messages {
            self.remote
                .handle_server_message(message, local_time)
                .unwrap();
        }
    }
}

pub fn time_at(tick: u32) -> f32 {
    tick as f32 * DT
}
