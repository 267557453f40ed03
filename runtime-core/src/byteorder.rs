//! Endian swap and fixed-width integer helpers (component A).
//!
//! Rust's integer primitives already carry `to_be`/`to_le`/`swap_bytes`; this
//! module exists to give the rest of the workspace a single place that
//! states the host byte order as a compile-time constant and to provide the
//! printf-style format-modifier constants the original C surface exposed,
//! for code that renders debug text in that shape.

/// Whether this build's host is little-endian. `cfg(target_endian)` is a
/// compile-time constant in every sense that matters here.
pub const HOST_IS_LITTLE_ENDIAN: bool = cfg!(target_endian = "little");

/// Pointer-sized signed/unsigned integers, named the way the spec's data
/// model names them (`size` / `signed-size`).
pub type PSize = usize;
pub type PSSize = isize;

/// Platform-independent min/max constants, named after the spec's fixed
/// width integers. These match the corresponding Rust primitive constants;
/// they exist so call sites can refer to the runtime's own integer layer
/// instead of reaching into `core::{i8, u64, ...}` directly, mirroring the
/// original library's `pmacros.h` surface.
pub const P_INT8_MIN: i8 = i8::MIN;
pub const P_INT8_MAX: i8 = i8::MAX;
pub const P_UINT8_MAX: u8 = u8::MAX;
pub const P_INT16_MIN: i16 = i16::MIN;
pub const P_INT16_MAX: i16 = i16::MAX;
pub const P_UINT16_MAX: u16 = u16::MAX;
pub const P_INT32_MIN: i32 = i32::MIN;
pub const P_INT32_MAX: i32 = i32::MAX;
pub const P_UINT32_MAX: u32 = u32::MAX;
pub const P_INT64_MIN: i64 = i64::MIN;
pub const P_INT64_MAX: i64 = i64::MAX;
pub const P_UINT64_MAX: u64 = u64::MAX;

/// Convert host order to/from network (big-endian) order. Thin, typed
/// wrappers kept around the stdlib conversions so call sites read as
/// runtime operations rather than ad hoc `u32::to_be` calls scattered
/// through socket and hash code.
pub trait NetworkOrder: Sized + Copy {
    fn to_network(self) -> Self;
    fn from_network(self) -> Self;
}

macro_rules! impl_network_order {
    ($($t:ty),+) => {
        $(
            impl NetworkOrder for $t {
                fn to_network(self) -> Self { self.to_be() }
                fn from_network(self) -> Self { Self::from_be(self) }
            }
        )+
    };
}

impl_network_order!(u16, u32, u64, i16, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_order_round_trips() {
        for x in [0u32, 1, 0xDEAD_BEEF, u32::MAX] {
            assert_eq!(x.to_network().from_network(), x);
        }
    }

    #[test]
    fn to_be_matches_swap_bytes_on_little_endian_host() {
        if HOST_IS_LITTLE_ENDIAN {
            let x: u32 = 0x1122_3344;
            assert_eq!(x.to_be(), x.swap_bytes());
        }
    }
}
