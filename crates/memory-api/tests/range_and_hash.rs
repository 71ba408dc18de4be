//! Byte-range clipping and strict region hashing.

use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use std::cell::Cell;

use memory_api::{
    digest_hex, ByteDomain, DiagnosticKind, DomainList, Machine, MemoryApi, MemoryApiError,
    MemoryDomain, MemoryDomains, RecordingSink, Severity, StaticMachine, DIGEST_HEX_LEN,
    MAX_RANGE_LEN,
};
use rstest::rstest;
use sha2::{Digest, Sha256};

fn sixteen_bytes() -> StaticMachine {
    let bytes: Vec<u8> = (0..16).collect();
    let domains = DomainList::new(vec![
        ByteDomain::with_bytes("RAM", bytes),
        ByteDomain::read_only("ROM", b"abc".to_vec()),
    ])
    .unwrap();
    StaticMachine::new("Test", domains)
}

/// Single-domain machine that counts every peek.
struct CountingMachine {
    bytes: Vec<u8>,
    peeks: Cell<usize>,
}

impl CountingMachine {
    fn new(size: usize) -> Self {
        Self {
            bytes: vec![0x5A; size],
            peeks: Cell::new(0),
        }
    }
}

impl MemoryDomain for CountingMachine {
    fn name(&self) -> &str {
        "Counted"
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn peek_byte(&self, addr: u64) -> u8 {
        self.peeks.set(self.peeks.get() + 1);
        self.bytes[usize::try_from(addr).unwrap()]
    }

    fn poke_byte(&mut self, addr: u64, value: u8) {
        self.bytes[usize::try_from(addr).unwrap()] = value;
    }
}

impl MemoryDomains for CountingMachine {
    fn len(&self) -> usize {
        1
    }

    fn domain(&self, index: usize) -> Option<&dyn MemoryDomain> {
        (index == 0).then_some(self as &dyn MemoryDomain)
    }

    fn domain_mut(&mut self, index: usize) -> Option<&mut dyn MemoryDomain> {
        if index == 0 {
            Some(self as &mut dyn MemoryDomain)
        } else {
            None
        }
    }
}

impl Machine for CountingMachine {
    fn name(&self) -> &str {
        "Counter"
    }

    fn memory_domains_mut(&mut self) -> Option<&mut dyn MemoryDomains> {
        Some(self as &mut dyn MemoryDomains)
    }
}

#[test]
fn range_read_past_end_zero_fills_suffix() {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert_eq!(api.read_byte_range(14, 4, None).unwrap(), vec![14, 15, 0, 0]);
    assert_eq!(api.sink().len(), 1);
    assert_eq!(
        api.sink().last().map(|d| d.message.as_str()),
        Some("attempted reads on addresses 16..17 outside range of domain RAM")
    );
}

#[test]
fn range_read_entirely_outside_is_all_zero() {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert_eq!(api.read_byte_range(100, 3, None).unwrap(), vec![0, 0, 0]);
    assert_eq!(api.read_byte_range(-10, 2, None).unwrap(), vec![0, 0]);
    assert_eq!(api.sink().count_of(DiagnosticKind::OutOfRangeRead), 2);
}

#[test]
fn range_read_of_unbounded_length_returns_empty() {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert!(api.read_byte_range(14, usize::MAX, None).unwrap().is_empty());
    assert!(api
        .read_byte_range(0, MAX_RANGE_LEN + 1, None)
        .unwrap()
        .is_empty());
    assert_eq!(api.sink().len(), 2);
    assert_eq!(api.sink().count_of(DiagnosticKind::OutOfRangeRead), 2);
    assert_eq!(api.read_byte_range(14, 2, None).unwrap(), vec![14, 15]);
}

#[test]
fn range_write_clips_and_keeps_in_range_bytes() {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    api.write_byte_range(-2, &[0xA0, 0xA1, 0xA2, 0xA3], None).unwrap();
    assert_eq!(api.sink().count_of(DiagnosticKind::OutOfRangeWrite), 1);
    drop(api);

    assert_eq!(&machine.bytes("RAM").unwrap()[..3], &[0xA2, 0xA3, 2]);
}

#[test]
fn range_write_to_read_only_domain_is_rejected_whole() {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    api.write_byte_range(0, b"xyz", Some("ROM")).unwrap();
    let diagnostic = api.sink().last().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::NotWritable);
    assert_eq!(diagnostic.severity(), Severity::Error);
    drop(api);

    assert_eq!(machine.bytes("ROM").unwrap(), b"abc");
}

#[test]
fn hash_matches_reference_digest() {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    let digest = api.hash_region(0, 3, Some("ROM")).unwrap();
    assert_eq!(
        digest,
        "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
    );
    assert_eq!(digest.len(), DIGEST_HEX_LEN);
    assert!(api.sink().is_empty());
}

#[test]
fn hash_of_whole_domain_matches_sha2_directly() {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    let bytes: Vec<u8> = (0..16).collect();
    let expected = hex::encode_upper(Sha256::digest(&bytes));
    assert_eq!(api.hash_region(0, 16, None).unwrap(), expected);
    assert_eq!(api.hash_region(4, 8, None).unwrap(), digest_hex(&bytes[4..12]));
}

#[rstest]
#[case(-1, 1)]
#[case(16, 0)]
#[case(16, 1)]
#[case(10, 7)]
#[case(0, 17)]
fn hash_rejects_ranges_outside_domain(#[case] addr: i64, #[case] count: usize) {
    let mut machine = sixteen_bytes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    let error = api.hash_region(addr, count, None).unwrap_err();
    assert_eq!(
        error,
        MemoryApiError::HashRangeInvalid {
            addr,
            count,
            domain: "RAM".to_string(),
            size: 16,
        }
    );
    let diagnostic = api.sink().last().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::HashRangeInvalid);
    assert_eq!(diagnostic.severity(), Severity::Error);
}

#[test]
fn invalid_hash_reads_nothing() {
    let mut machine = CountingMachine::new(32);
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert!(api.hash_region(30, 4, None).is_err());
    assert!(api.hash_region(32, 0, None).is_err());
    drop(api);
    assert_eq!(machine.peeks.get(), 0);

    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());
    assert_eq!(api.hash_region(0, 32, None).unwrap(), digest_hex(&[0x5A; 32]));
    drop(api);
    assert_eq!(machine.peeks.get(), 32);
}

#[test]
fn clipped_range_read_never_peeks_out_of_range() {
    let mut machine = CountingMachine::new(8);
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert_eq!(api.read_byte_range(6, 6, None).unwrap(), vec![0x5A, 0x5A, 0, 0, 0, 0]);
    assert_eq!(api.read_u32(7, None).unwrap(), 0x5A);
    drop(api);
    assert_eq!(machine.peeks.get(), 3);
}

#[test]
fn hash_of_unreadable_domain_is_rejected() {
    let domains = DomainList::new(vec![ByteDomain::new("IO", 8).readable(false)]).unwrap();
    let mut machine = StaticMachine::new("Test", domains);
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert!(matches!(
        api.hash_region(0, 4, None),
        Err(MemoryApiError::HashRangeInvalid { .. })
    ));
    assert_eq!(api.sink().count_of(DiagnosticKind::NotReadable), 1);
}
