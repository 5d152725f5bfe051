//! Bounded bit and byte packing primitives for the glide protocol.
//!
//! This crate provides [`BitWriter`] and [`BitReader`] for bit-level and
//! byte-aligned encoding, plus half-float conversion ([`f32_to_f16`],
//! [`f16_to_f32`]) used for compressed vector axes.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads/writes are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about transforms or sync state.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3).unwrap();
//! writer.align_to_byte();
//! writer.write_f16_aligned(0.5).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! reader.align_to_byte().unwrap();
//! assert_eq!(reader.read_f16_aligned().unwrap(), 0.5);
//! ```

mod error;
mod half;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use half::{f16_to_f32, f32_to_f16};
pub use reader::BitReader;
pub use writer::BitWriter;
