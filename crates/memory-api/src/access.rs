//! Width, byte-order and range-clipping helpers shared by every accessor.
//!
//! Nothing here touches a domain. Addresses arrive as signed 64-bit values
//! straight from callers and are widened to `i128` before any arithmetic so
//! that no caller input can overflow.

/// Byte order used to assemble and decompose multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Endianness {
    /// Byte `i` carries bits `8i..8i+8`.
    #[default]
    Little,
    /// Byte `i` carries bits `8(w-1-i)..8(w-1-i)+8`.
    Big,
}

impl Endianness {
    /// Maps a big-endian flag to a byte order.
    #[must_use]
    pub const fn from_big(big_endian: bool) -> Self {
        if big_endian {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Returns `true` for [`Endianness::Big`].
    #[must_use]
    pub const fn is_big(self) -> bool {
        matches!(self, Self::Big)
    }
}

/// Supported scalar access widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessWidth {
    /// One byte.
    Bits8,
    /// Two bytes.
    Bits16,
    /// Three bytes.
    Bits24,
    /// Four bytes.
    Bits32,
}

impl AccessWidth {
    /// Number of bytes covered by this width.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        match self {
            Self::Bits8 => 1,
            Self::Bits16 => 2,
            Self::Bits24 => 3,
            Self::Bits32 => 4,
        }
    }

    /// Maps a byte count to a width; only 1 through 4 are supported.
    #[must_use]
    pub const fn from_bytes(bytes: u8) -> Option<Self> {
        match bytes {
            1 => Some(Self::Bits8),
            2 => Some(Self::Bits16),
            3 => Some(Self::Bits24),
            4 => Some(Self::Bits32),
            _ => None,
        }
    }

    /// Mask selecting the low `8 * bytes()` bits.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Bits8 => 0xFF,
            Self::Bits16 => 0xFFFF,
            Self::Bits24 => 0x00FF_FFFF,
            Self::Bits32 => u32::MAX,
        }
    }
}

/// One scalar access as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessRequest {
    /// First byte address; may be negative or past the domain end.
    pub address: i64,
    /// Access width.
    pub width: AccessWidth,
    /// Sign-extend the assembled value on reads.
    pub signed: bool,
    /// Byte order for assembly and decomposition.
    pub endianness: Endianness,
}

impl AccessRequest {
    /// Creates an unsigned request.
    #[must_use]
    pub const fn unsigned(address: i64, width: AccessWidth, endianness: Endianness) -> Self {
        Self {
            address,
            width,
            signed: false,
            endianness,
        }
    }

    /// Creates a signed request.
    #[must_use]
    pub const fn signed(address: i64, width: AccessWidth, endianness: Endianness) -> Self {
        Self {
            address,
            width,
            signed: true,
            endianness,
        }
    }

    /// Interprets an assembled unsigned value according to `signed`.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn interpret(&self, raw: u32) -> i64 {
        if self.signed {
            sign_extend(raw, self.width) as i64
        } else {
            raw as i64
        }
    }
}

/// Bit position of byte `index` within a value of `width`.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn byte_shift(endianness: Endianness, width: AccessWidth, index: u8) -> u32 {
    let position = match endianness {
        Endianness::Little => index,
        Endianness::Big => width.bytes() - 1 - index,
    };
    8 * position as u32
}

/// Sign-extends the low `width` bytes of `value` to 32 bits.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_lossless)]
pub const fn sign_extend(value: u32, width: AccessWidth) -> i32 {
    let shift = 8 * (4 - width.bytes() as u32);
    ((value << shift) as i32) >> shift
}

/// Address of byte `offset` past `base`, when it falls inside `[0, size)`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]
pub const fn offset_address(base: i64, offset: u64, size: u64) -> Option<u64> {
    let addr = base as i128 + offset as i128;
    if addr >= 0 && addr < size as i128 {
        Some(addr as u64)
    } else {
        None
    }
}

/// Result of clipping a caller range against `[0, size)`.
///
/// Out-of-range spans are inclusive address pairs as requested by the caller,
/// which is how they are reported in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeClip {
    /// First in-bounds domain address, when any byte is in bounds.
    pub first_address: Option<u64>,
    /// Buffer index of the first in-bounds byte.
    pub start_index: usize,
    /// Buffer index one past the last in-bounds byte.
    pub end_index: usize,
    /// Requested addresses below zero.
    pub below: Option<(i128, i128)>,
    /// Requested addresses at or past the domain end.
    pub above: Option<(i128, i128)>,
}

impl RangeClip {
    /// Number of in-bounds bytes.
    #[must_use]
    pub const fn in_bounds_len(&self) -> usize {
        self.end_index - self.start_index
    }

    /// Returns `true` when any requested byte fell outside the domain.
    #[must_use]
    pub const fn is_clipped(&self) -> bool {
        self.below.is_some() || self.above.is_some()
    }

    /// Human-readable list of the out-of-range spans, e.g. `-2..-1 and 16..17`.
    #[must_use]
    pub fn describe_out_of_range(&self) -> Option<String> {
        match (self.below, self.above) {
            (None, None) => None,
            (Some((lo, hi)), None) | (None, Some((lo, hi))) => Some(format!("{lo}..{hi}")),
            (Some((blo, bhi)), Some((alo, ahi))) => {
                Some(format!("{blo}..{bhi} and {alo}..{ahi}"))
            }
        }
    }
}

/// Clips `length` bytes starting at `addr` to a domain of `size` bytes.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn clip_range(addr: i64, length: usize, size: u64) -> RangeClip {
    let start = i128::from(addr);
    let end = start + length as i128;
    let size = i128::from(size);

    if length == 0 {
        return RangeClip {
            first_address: None,
            start_index: 0,
            end_index: 0,
            below: None,
            above: None,
        };
    }

    let lo = start.max(0);
    let hi = end.min(size);
    let (first_address, start_index, end_index) = if lo < hi {
        (Some(lo as u64), (lo - start) as usize, (hi - start) as usize)
    } else {
        (None, 0, 0)
    };

    let below = (start < 0).then_some((start, end.min(0) - 1));
    let above = (end > size).then_some((start.max(size), end - 1));

    RangeClip {
        first_address,
        start_index,
        end_index,
        below,
        above,
    }
}
