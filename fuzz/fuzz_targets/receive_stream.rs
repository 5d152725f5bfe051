#![no_main]

use libfuzzer_sys::fuzz_target;
use replication::{
    Body, Outbox, StaticAuthority, SyncConfig, SyncMessage, TeleportMessage, TickContext,
    TransformSync,
};

// Feeds arbitrary frames to an observer and ticks it between them.
fuzz_target!(|data: &[u8]| {
    let Ok(mut sync) = TransformSync::new(
        SyncConfig::for_testing(),
        StaticAuthority::observer(),
        Some(Body::default()),
    ) else {
        return;
    };
    let mut outbox = Outbox::new();
    let mut now = 0.0f32;
    let mut idx = 0usize;

    while idx < data.len() && idx < 4096 {
        let control = data[idx];
        let len = usize::from(control % 48);
        idx += 1;
        let end = (idx + len).min(data.len());
        let frame = data[idx..end].to_vec();
        idx = end;

        let message = match control >> 6 {
            0 | 1 => SyncMessage::Transform(frame),
            2 => SyncMessage::Enable(control & 1 != 0),
            _ => SyncMessage::Teleport(teleport_from(&frame)),
        };
        let _ = sync.handle_server_message(&message, now);

        now += f32::from(control & 0x3f) / 600.0;
        let _ = sync.tick(&TickContext::new(now, 1.0 / 60.0), &mut outbox);
    }
});

fn teleport_from(frame: &[u8]) -> TeleportMessage {
    let mut values = [0.0f32; 10];
    for (value, chunk) in values.iter_mut().zip(frame.chunks_exact(4)) {
        *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let vec = |i: usize| glam::Vec3::new(values[i], values[i + 1], values[i + 2]);
    TeleportMessage {
        position: vec(0),
        rotation_euler: vec(3),
        scale: vec(6),
        timestamp: values[9],
    }
}
