#![no_main]

use libfuzzer_sys::fuzz_target;
use memory_api::{
    clip_range, hash_bounds, AccessWidth, ByteDomain, DomainList, MemoryApi, RecordingSink,
    StaticMachine,
};

const DOMAIN_SIZE: usize = 256;
const MAX_RANGE: usize = 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() < 12 {
        return;
    }

    let addr = i64::from_le_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]);
    let width = AccessWidth::from_bytes(data[8] % 4 + 1).unwrap_or(AccessWidth::Bits8);
    let length = usize::from(u16::from_le_bytes([data[9], data[10]])) % MAX_RANGE;
    let flags = data[11];
    let payload = &data[12..];

    let clip = clip_range(addr, length, DOMAIN_SIZE as u64);
    assert!(clip.end_index <= length);
    assert!(clip.start_index <= clip.end_index);
    if let Some(range) = hash_bounds(addr, length, DOMAIN_SIZE as u64) {
        assert!(range.end <= DOMAIN_SIZE as u64);
    }

    let domains = match DomainList::new(vec![
        ByteDomain::with_bytes("RAM", vec![0xA5; DOMAIN_SIZE]),
        ByteDomain::read_only("ROM", vec![0x5A; DOMAIN_SIZE]),
    ]) {
        Ok(domains) => domains,
        Err(_) => return,
    };
    let mut machine = StaticMachine::new("Fuzz", domains);
    let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());
    api.set_big_endian(flags & 1 != 0);
    let domain = if flags & 2 != 0 { Some("ROM") } else { None };

    let _ = api.read_unsigned(addr, width, domain);
    let _ = api.write_unsigned(addr, width, u32::from(flags), domain);
    if let Ok(bytes) = api.read_byte_range(addr, length, domain) {
        assert_eq!(bytes.len(), length);
    }
    let _ = api.write_byte_range(addr, payload, domain);
    let _ = api.hash_region(addr, length, domain);
    assert!(api.sink().len() <= 5);
    drop(api);

    assert_eq!(machine.bytes("ROM"), Some(&[0x5A; DOMAIN_SIZE][..]));
});
