//! Current-domain binding and name resolution through the public API.

use hex as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use sha2 as _;
use thiserror as _;
use tracing as _;

use memory_api::{
    ByteDomain, DiagnosticKind, DomainBinding, DomainList, MemoryApi, MemoryApiError,
    RecordingSink, StaticMachine,
};

fn snes() -> StaticMachine {
    let domains = DomainList::new(vec![
        ByteDomain::new("WRAM", 0x2_0000),
        ByteDomain::read_only("CARTROM", vec![0x4C; 0x8000]),
        ByteDomain::new("VRAM", 0x1_0000),
        ByteDomain::new("System Bus", 0x100_0000),
    ])
    .unwrap()
    .with_system_bus("System Bus")
    .unwrap();
    StaticMachine::new("SNES", domains)
}

fn gameboy_without_bus() -> StaticMachine {
    let domains = DomainList::new(vec![
        ByteDomain::new("ROM", 0x8000),
        ByteDomain::new("WRAM", 0x2000),
    ])
    .unwrap()
    .with_main_memory("WRAM")
    .unwrap();
    StaticMachine::new("GB", domains)
}

#[test]
fn first_access_binds_system_bus() {
    let mut machine = snes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert_eq!(api.binding(), DomainBinding::Unbound);
    api.write_u8(0x7E_0000, 0x42, None).unwrap();
    assert_eq!(api.binding(), DomainBinding::Bound(3));
    assert_eq!(api.current_domain_name().unwrap(), "System Bus");
    drop(api);

    assert_eq!(machine.bytes("System Bus").unwrap()[0x7E_0000], 0x42);
}

#[test]
fn main_memory_is_default_without_system_bus() {
    let mut machine = gameboy_without_bus();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    let current = api.current_domain().unwrap();
    assert_eq!(current.name, "WRAM");
    assert_eq!(current.size, 0x2000);
    assert!(!current.is_system_bus);
}

#[test]
fn list_domains_preserves_registry_order() {
    let mut machine = snes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert_eq!(
        api.list_domains().unwrap(),
        vec!["WRAM", "CARTROM", "VRAM", "System Bus"]
    );
    assert_eq!(api.binding(), DomainBinding::Unbound);
    assert!(api.sink().is_empty());
}

#[test]
fn select_then_fail_keeps_previous_domain() {
    let mut machine = snes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert!(api.select_domain("VRAM").unwrap());
    assert!(!api.select_domain("OAM").unwrap());
    assert_eq!(api.current_domain_name().unwrap(), "VRAM");
    assert_eq!(api.sink().count_of(DiagnosticKind::DomainNotFound), 1);
}

#[test]
fn named_access_does_not_rebind() {
    let mut machine = snes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert!(api.select_domain("WRAM").unwrap());
    assert_eq!(api.read_u8(0, Some("CARTROM")).unwrap(), 0x4C);
    assert_eq!(api.current_domain_name().unwrap(), "WRAM");
}

#[test]
fn unknown_name_falls_back_to_current_domain() {
    let mut machine = snes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert!(api.select_domain("WRAM").unwrap());
    api.write_u16(0x10, 0xBEEF, Some("SRAM")).unwrap();
    assert_eq!(api.read_u16(0x10, None).unwrap(), 0xBEEF);

    let diagnostic = api.sink().last().unwrap().clone();
    assert_eq!(diagnostic.kind, DiagnosticKind::DomainNotFound);
    assert_eq!(
        diagnostic.message,
        "Unable to find domain: SRAM, falling back to current"
    );
    drop(api);
    assert_eq!(&machine.bytes("WRAM").unwrap()[0x10..0x12], &[0xEF, 0xBE]);
}

#[test]
fn empty_name_means_current_domain() {
    let mut machine = snes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    assert!(api.select_domain("VRAM").unwrap());
    assert_eq!(api.domain_size(Some("")).unwrap(), 0x1_0000);
    assert_eq!(api.domain_size(Some("WRAM")).unwrap(), 0x2_0000);
    assert!(api.sink().is_empty());
}

#[test]
fn find_domain_reports_capabilities_silently() {
    let mut machine = snes();
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    let rom = api.find_domain("CARTROM").unwrap().unwrap();
    assert!(!rom.writable);
    assert!(rom.readable);
    assert!(api.find_domain("SRAM").unwrap().is_none());
    assert!(api.sink().is_empty());
}

#[test]
fn machine_without_domains_is_a_hard_failure() {
    let mut machine = StaticMachine::without_domains("Atari 2600");
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

    let error = api.current_domain().unwrap_err();
    assert_eq!(
        error,
        MemoryApiError::UnsupportedCapability {
            machine: "Atari 2600".to_string()
        }
    );
    assert_eq!(error.kind(), DiagnosticKind::UnsupportedCapability);
    assert!(api.read_byte_range(0, 4, None).is_err());
    assert_eq!(api.diagnostic_counters().count(DiagnosticKind::UnsupportedCapability), 2);
}

#[test]
fn independent_instances_do_not_share_state() {
    let mut first = snes();
    let mut second = snes();
    let mut a = MemoryApi::with_sink(&mut first, RecordingSink::new());
    let mut b = MemoryApi::with_sink(&mut second, RecordingSink::new());

    a.set_big_endian(true);
    assert!(a.select_domain("VRAM").unwrap());

    assert!(!b.endianness().is_big());
    assert_eq!(b.current_domain_name().unwrap(), "System Bus");
}
