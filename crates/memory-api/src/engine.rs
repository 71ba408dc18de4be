//! Multi-width and range accessors built only from bounds-checked byte access.
//!
//! Out-of-range bytes never reach the domain. Each logical call emits at most
//! one out-of-range diagnostic no matter how many of its bytes missed.

use crate::{
    byte_shift, clip_range, offset_address, AccessRequest, DiagnosticChannel, DiagnosticKind,
    DiagnosticSink, MemoryDomain,
};

/// Reads byte `offset` past `base`, or `None` when it lies outside the domain.
#[must_use]
pub fn peek_byte(domain: &dyn MemoryDomain, base: i64, offset: u64) -> Option<u8> {
    offset_address(base, offset, domain.size()).map(|addr| domain.peek_byte(addr))
}

/// Writes byte `offset` past `base`; returns `false` when it lies outside the domain.
pub fn poke_byte(domain: &mut dyn MemoryDomain, base: i64, offset: u64, value: u8) -> bool {
    match offset_address(base, offset, domain.size()) {
        Some(addr) => {
            domain.poke_byte(addr, value);
            true
        }
        None => false,
    }
}

/// Assembles an unsigned value of `request.width` bytes.
///
/// Bytes outside the domain read as zero. Unreadable domains yield zero.
pub fn read_unsigned<S: DiagnosticSink>(
    domain: &dyn MemoryDomain,
    diagnostics: &mut DiagnosticChannel<S>,
    request: &AccessRequest,
) -> u32 {
    if !domain.is_readable() {
        diagnostics.emit(
            DiagnosticKind::NotReadable,
            format!("the domain {} is not readable", domain.name()),
        );
        return 0;
    }

    let mut value = 0_u32;
    let mut first_miss = None;
    for index in 0..request.width.bytes() {
        match peek_byte(domain, request.address, u64::from(index)) {
            Some(byte) => {
                value |= u32::from(byte) << byte_shift(request.endianness, request.width, index);
            }
            None => {
                first_miss.get_or_insert(i128::from(request.address) + i128::from(index));
            }
        }
    }

    if let Some(addr) = first_miss {
        diagnostics.emit(
            DiagnosticKind::OutOfRangeRead,
            format!(
                "attempted read of {addr} outside the memory size of {} of domain {}",
                domain.size(),
                domain.name()
            ),
        );
    }
    value
}

/// Decomposes the low `request.width` bytes of `value` into the domain.
///
/// Non-writable domains reject the whole write. Bytes outside the domain are
/// dropped while in-range bytes are still written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_unsigned<S: DiagnosticSink>(
    domain: &mut dyn MemoryDomain,
    diagnostics: &mut DiagnosticChannel<S>,
    request: &AccessRequest,
    value: u32,
) {
    if !domain.is_writable() {
        diagnostics.emit(
            DiagnosticKind::NotWritable,
            format!("the domain {} is not writable", domain.name()),
        );
        return;
    }

    let mut first_miss = None;
    for index in 0..request.width.bytes() {
        let shift = byte_shift(request.endianness, request.width, index);
        let byte = ((value >> shift) & 0xFF) as u8;
        if !poke_byte(domain, request.address, u64::from(index), byte) {
            first_miss.get_or_insert(i128::from(request.address) + i128::from(index));
        }
    }

    if let Some(addr) = first_miss {
        diagnostics.emit(
            DiagnosticKind::OutOfRangeWrite,
            format!(
                "attempted write to {addr} outside the memory size of {} of domain {}",
                domain.size(),
                domain.name()
            ),
        );
    }
}

/// Largest byte count a single range read may request.
pub const MAX_RANGE_LEN: usize = 0x7FFF_FFFF;

/// Reads `length` bytes from `addr`, zero-filling positions outside the domain.
///
/// The returned buffer holds exactly `length` bytes. Requests longer than
/// [`MAX_RANGE_LEN`], or that cannot be allocated, return an empty buffer and
/// one out-of-range diagnostic.
pub fn read_range<S: DiagnosticSink>(
    domain: &dyn MemoryDomain,
    diagnostics: &mut DiagnosticChannel<S>,
    addr: i64,
    length: usize,
) -> Vec<u8> {
    let mut buffer = Vec::new();
    if length == 0 {
        return buffer;
    }
    if length > MAX_RANGE_LEN {
        diagnostics.emit(
            DiagnosticKind::OutOfRangeRead,
            format!(
                "attempted read of {length} bytes exceeds the maximum range length of {MAX_RANGE_LEN} in domain {}",
                domain.name()
            ),
        );
        return buffer;
    }
    if buffer.try_reserve_exact(length).is_err() {
        diagnostics.emit(
            DiagnosticKind::OutOfRangeRead,
            format!(
                "unable to allocate {length} bytes for a read from domain {}",
                domain.name()
            ),
        );
        return buffer;
    }
    buffer.resize(length, 0);
    if !domain.is_readable() {
        diagnostics.emit(
            DiagnosticKind::NotReadable,
            format!("the domain {} is not readable", domain.name()),
        );
        return buffer;
    }

    let clip = clip_range(addr, length, domain.size());
    if let Some(first) = clip.first_address {
        for (slot, addr) in buffer[clip.start_index..clip.end_index]
            .iter_mut()
            .zip(first..)
        {
            *slot = domain.peek_byte(addr);
        }
    }

    if let Some(span) = clip.describe_out_of_range() {
        diagnostics.emit(
            DiagnosticKind::OutOfRangeRead,
            format!(
                "attempted reads on addresses {span} outside range of domain {}",
                domain.name()
            ),
        );
    }
    buffer
}

/// Writes `bytes` starting at `addr`, dropping positions outside the domain.
///
/// Non-writable domains reject the whole range.
pub fn write_range<S: DiagnosticSink>(
    domain: &mut dyn MemoryDomain,
    diagnostics: &mut DiagnosticChannel<S>,
    addr: i64,
    bytes: &[u8],
) {
    if bytes.is_empty() {
        return;
    }
    if !domain.is_writable() {
        diagnostics.emit(
            DiagnosticKind::NotWritable,
            format!("the domain {} is not writable", domain.name()),
        );
        return;
    }

    let clip = clip_range(addr, bytes.len(), domain.size());
    if let Some(first) = clip.first_address {
        for (byte, addr) in bytes[clip.start_index..clip.end_index].iter().zip(first..) {
            domain.poke_byte(addr, *byte);
        }
    }

    if let Some(span) = clip.describe_out_of_range() {
        diagnostics.emit(
            DiagnosticKind::OutOfRangeWrite,
            format!(
                "attempted writes on addresses {span} outside range of domain {}",
                domain.name()
            ),
        );
    }
}
