//! IEEE 754 binary16 conversion.
//!
//! Conversions round to nearest, ties to even. Values too large for a half
//! become infinity, values too small flush through the subnormal range to
//! signed zero. NaN payloads keep their top mantissa bits.

/// Converts an `f32` to the bit pattern of the nearest `f16`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn f32_to_f16(value: f32) -> u16 {
    let x = value.to_bits();
    let sign = x & 0x8000_0000;
    let exp = x & 0x7F80_0000;
    let man = x & 0x007F_FFFF;

    if exp == 0x7F80_0000 {
        let nan_bit = if man == 0 { 0 } else { 0x0200 };
        return ((sign >> 16) | 0x7C00 | nan_bit | (man >> 13)) as u16;
    }

    let half_sign = sign >> 16;
    let half_exp = ((exp >> 23) as i32) - 127 + 15;

    if half_exp >= 0x1F {
        return (half_sign | 0x7C00) as u16;
    }

    if half_exp <= 0 {
        if 14 - half_exp > 24 {
            return half_sign as u16;
        }
        let man = man | 0x0080_0000;
        let shift = (14 - half_exp) as u32;
        let mut half_man = man >> shift;
        let round_bit = 1u32 << (shift - 1);
        if (man & round_bit) != 0 && (man & (3 * round_bit - 1)) != 0 {
            half_man += 1;
        }
        return (half_sign | half_man) as u16;
    }

    let half_exp = (half_exp as u32) << 10;
    let half_man = man >> 13;
    let round_bit = 0x0000_1000u32;
    let packed = half_sign | half_exp | half_man;
    if (man & round_bit) != 0 && (man & (3 * round_bit - 1)) != 0 {
        (packed + 1) as u16
    } else {
        packed as u16
    }
}

/// Expands an `f16` bit pattern to `f32`. Exact for every input.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f16_to_f32(bits: u16) -> f32 {
    if bits & 0x7FFF == 0 {
        return f32::from_bits(u32::from(bits) << 16);
    }

    let half_sign = u32::from(bits & 0x8000);
    let half_exp = u32::from(bits & 0x7C00);
    let half_man = u32::from(bits & 0x03FF);
    let sign = half_sign << 16;

    if half_exp == 0x7C00 {
        if half_man == 0 {
            return f32::from_bits(sign | 0x7F80_0000);
        }
        return f32::from_bits(sign | 0x7FC0_0000 | (half_man << 13));
    }

    if half_exp == 0 {
        // Subnormal half: renormalize into the f32 exponent range.
        let e = (half_man as u16).leading_zeros() - 6;
        let exp = (127 - 15 - e) << 23;
        let man = (half_man << (14 + e)) & 0x007F_FFFF;
        return f32::from_bits(sign | exp | man);
    }

    let exp = ((half_exp >> 10) + 127 - 15) << 23;
    let man = half_man << 13;
    f32::from_bits(sign | exp | man)
}
