//! Address and Packet Unit Tests.

use pretty_assertions::assert_eq;
use rstest::rstest;
use simcache_core::common::{Addr, AddrRange, CacheError, MemCmd, Packet};

// ══════════════════════════════════════════════════════════
// 1. Block arithmetic
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(0x1004, 4, true, false)]
#[case(0x1000, 64, true, true)]
#[case(0x103C, 4, true, false)]
#[case(0x103C, 8, false, false)]
#[case(0x1001, 64, false, false)]
fn block_fit(#[case] addr: u64, #[case] size: usize, #[case] fits: bool, #[case] whole: bool) {
    let pkt = Packet::read(1, Addr::new(addr), size);
    assert_eq!(pkt.fits_in_block(64), fits);
    assert_eq!(pkt.is_whole_block(64), whole);
    assert_eq!(pkt.block_addr(64), Addr::new(addr & !63));
}

#[test]
fn block_copies_use_the_offset() {
    let mut block: Vec<u8> = (0..64).collect();
    let mut rd = Packet::read(1, Addr::new(0x1010), 4);
    rd.set_data_from_block(&block);
    assert_eq!(rd.data(), &[16, 17, 18, 19]);

    let wr = Packet::write(2, Addr::new(0x103E), vec![0xAA, 0xBB]);
    wr.write_data_to_block(&mut block);
    assert_eq!(&block[62..], &[0xAA, 0xBB]);
}

#[test]
fn ranges_reject_spans_past_the_end() {
    let range = AddrRange::with_size(0x1000, 0x100);
    assert!(range.contains(Addr::new(0x10FF)));
    assert!(!range.contains(Addr::new(0x1100)));
    assert!(range.contains_span(Addr::new(0x10F0), 16));
    assert!(!range.contains_span(Addr::new(0x10F0), 17));
    assert!(!range.contains_span(Addr::new(u64::MAX), 2));
}

// ══════════════════════════════════════════════════════════
// 2. Commands and responses
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(MemCmd::ReadReq, MemCmd::ReadResp)]
#[case(MemCmd::WriteReq, MemCmd::WriteResp)]
fn requests_turn_into_responses(#[case] req: MemCmd, #[case] resp: MemCmd) {
    let mut pkt = Packet::new(1, req, Addr::new(0), 8);
    assert!(pkt.needs_response());
    pkt.make_response().unwrap();
    assert_eq!(pkt.cmd(), resp);
    assert!(pkt.is_response());
    assert!(!pkt.needs_response());
}

#[rstest]
#[case(MemCmd::WritebackDirty)]
#[case(MemCmd::InvalidCmd)]
#[case(MemCmd::ReadResp)]
fn commands_without_a_response_form(#[case] cmd: MemCmd) {
    let mut pkt = Packet::new(1, cmd, Addr::new(0x40), 64);
    assert!(matches!(
        pkt.make_response(),
        Err(CacheError::UnknownCommand { .. })
    ));
    assert_eq!(pkt.cmd(), cmd);
}

#[test]
fn writebacks_carry_the_block_and_expect_nothing() {
    let wb = Packet::writeback(Addr::new(0x80), vec![3; 64]);
    assert_eq!(wb.cmd(), MemCmd::WritebackDirty);
    assert!(wb.is_write());
    assert!(!wb.needs_response());
    assert_eq!(wb.size(), 64);
}
