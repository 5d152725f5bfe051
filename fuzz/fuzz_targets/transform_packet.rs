#![no_main]

use libfuzzer_sys::fuzz_target;
use wire::{decode_packet, encode_packet, FieldLayout, Limits, SyncMode, WireLayout};

const MODES: [SyncMode; 8] = [
    SyncMode::Xyz,
    SyncMode::Xy,
    SyncMode::Xz,
    SyncMode::Yz,
    SyncMode::X,
    SyncMode::Y,
    SyncMode::Z,
    SyncMode::None,
];

fn field(byte: u8) -> FieldLayout {
    FieldLayout::new(MODES[usize::from(byte % 8)], byte & 0x80 != 0)
}

// The first six bytes pick the layout; the rest is the packet.
fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let layout = WireLayout {
        position: field(data[0]),
        rotation: field(data[1]),
        scale: field(data[2]),
        velocity: field(data[3]),
        angular_velocity: field(data[4]),
        origin_rebasing: data[5] & 1 != 0,
        character: data[5] & 2 != 0,
    };
    let limits = Limits::for_testing();

    if let Ok(state) = decode_packet(&data[6..], &layout, &limits) {
        // Anything that decodes must encode again within the layout maximum.
        if let Ok(bytes) = encode_packet(&state, &layout, &limits) {
            assert!(bytes.len() <= layout.max_packet_len());
        }
    }
});
