use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use glam::Vec3;
use replication::{
    Body, Outbox, StaticAuthority, SyncConfig, SyncMessage, TickContext, TransformSync,
};
use simbench::{preset, run_scenario};
use wire::{decode_packet, encode_packet, Limits, WireLayout, WireState};

const DT: f32 = 1.0 / 60.0;

fn sample_state() -> WireState {
    WireState {
        position: Some(Vec3::new(12.5, 1.0, -40.25)),
        rotation: Some(Vec3::new(0.0, 90.0, 0.0)),
        velocity: Some(Vec3::new(3.0, 0.0, 1.0)),
        ..WireState::new(12.0)
    }
}

fn bench_codec(c: &mut Criterion) {
    let layout = WireLayout::default();
    let limits = Limits::default();
    let state = sample_state();
    let bytes = encode_packet(&state, &layout, &limits).unwrap_or_default();

    c.bench_function("encode_packet", |b| {
        b.iter(|| encode_packet(black_box(&state), &layout, &limits));
    });
    c.bench_function("decode_packet", |b| {
        b.iter(|| decode_packet(black_box(&bytes), &layout, &limits));
    });
}

fn bench_tick(c: &mut Criterion) {
    c.bench_function("sender_tick", |b| {
        b.iter_batched(
            || {
                TransformSync::new(
                    SyncConfig::default(),
                    StaticAuthority::server_owned(),
                    Some(Body::default()),
                )
                .map(|sync| (sync, Outbox::new()))
            },
            |setup| {
                if let Ok((mut sync, mut outbox)) = setup {
                    for tick in 0..60u16 {
                        let now = f32::from(tick) * DT;
                        if let Some(body) = sync.target_mut() {
                            body.position.x = now;
                        }
                        sync.tick(&TickContext::new(now, DT), &mut outbox);
                    }
                    black_box(outbox.take_broadcasts().len());
                }
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("receiver_tick_interpolating", |b| {
        b.iter_batched(
            || {
                let config = SyncConfig::default();
                let mut owner = TransformSync::new(
                    config.clone(),
                    StaticAuthority::server_owned(),
                    Some(Body::default()),
                )
                .ok()?;
                let mut remote =
                    TransformSync::new(config, StaticAuthority::observer(), Some(Body::default()))
                        .ok()?;
                let mut outbox = Outbox::new();
                for tick in 0..60u16 {
                    let now = f32::from(tick) * DT;
                    if let Some(body) = owner.target_mut() {
                        body.position.x = now;
                    }
                    owner.tick(&TickContext::new(now, DT), &mut outbox);
                }
                for message in outbox.take_broadcasts() {
                    if let SyncMessage::Transform(_) = &message {
                        remote.handle_server_message(&message, 1.0).ok()?;
                    }
                }
                Some(remote)
            },
            |remote| {
                if let Some(mut remote) = remote {
                    let mut outbox = Outbox::new();
                    black_box(remote.tick(&TickContext::new(1.0, DT), &mut outbox));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_scenario(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario");
    group.sample_size(10);
    for name in ["perfect", "lossy"] {
        if let Some(scenario) = preset(name) {
            let scenario = scenario.with_ticks(300);
            let config = SyncConfig::default();
            group.bench_function(name, |b| {
                b.iter(|| run_scenario(black_box(&scenario), &config));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_codec, bench_tick, bench_scenario);
criterion_main!(benches);
