use std::time::Duration;

use proptest::prelude::*;
use rstest::rstest;
use securelock_core::CardUid;
use securelock_rfid::registers::{Register, error_bits, picc};
use securelock_rfid::sim::{SimulatedMfrc522, SimulatedMfrc522Handle};
use securelock_rfid::{Mfrc522, ReaderConfig};
use tokio::time::Instant;

const UID: CardUid = CardUid::new([0xDE, 0xAD, 0xBE, 0xEF]);

async fn ready_reader() -> (Mfrc522<SimulatedMfrc522>, SimulatedMfrc522Handle) {
    let (chip, handle) = SimulatedMfrc522::new();
    let mut reader = Mfrc522::new(chip, ReaderConfig::default());
    reader.init().await.unwrap();
    (reader, handle)
}

#[tokio::test(start_paused = true)]
async fn test_init_programs_timer_and_antenna() {
    let (chip, handle) = SimulatedMfrc522::new();
    let mut reader = Mfrc522::new(chip, ReaderConfig::default());

    let start = Instant::now();
    reader.init().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(70));
    assert_eq!(handle.hardware_resets(), 1);
    assert!(handle.antenna_on());
    assert_eq!(handle.register(Register::TMode), 0x8D);
    assert_eq!(handle.register(Register::TPrescaler), 0x3E);
    assert_eq!(handle.register(Register::TReloadL), 30);
    assert_eq!(handle.register(Register::TxAsk), 0x40);
    assert_eq!(handle.register(Register::Mode), 0x3D);
}

#[tokio::test(start_paused = true)]
async fn test_detect_and_read_card() {
    let (mut reader, handle) = ready_reader().await;
    assert!(!reader.detect_card().await);

    handle.present_card(UID);
    assert!(reader.detect_card().await);
    assert_eq!(reader.read_uid().await, Some(UID));

    let frames = handle.frames();
    assert_eq!(frames[frames.len() - 2], vec![picc::REQA]);
    assert_eq!(
        frames[frames.len() - 1],
        vec![picc::SEL_CL1, picc::NVB_ANTICOLLISION]
    );
}

#[tokio::test(start_paused = true)]
async fn test_halted_card_stops_answering_until_replaced() {
    let (mut reader, handle) = ready_reader().await;
    handle.present_card(UID);
    assert!(reader.detect_card().await);

    reader.halt().await;
    assert!(handle.card_halted());
    assert!(!reader.detect_card().await);

    handle.remove_card();
    handle.present_card(UID);
    assert!(reader.detect_card().await);
}

#[rstest]
#[case(error_bits::COLLISION)]
#[case(error_bits::CRC)]
#[case(error_bits::PARITY)]
#[case(error_bits::BUFFER_OVERFLOW)]
#[tokio::test(start_paused = true)]
async fn test_error_status_collapses_to_no_card(#[case] status: u8) {
    let (mut reader, handle) = ready_reader().await;
    handle.present_card(UID);
    handle.set_error_status(status);

    assert!(!reader.detect_card().await);
    assert_eq!(reader.read_uid().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_chip_bounded_by_deadline() {
    let (mut reader, handle) = ready_reader().await;
    handle.present_card(UID);
    handle.set_stalled(true);

    let start = Instant::now();
    assert!(!reader.detect_card().await);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(25));
    assert!(elapsed < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_bus_fault_releases_chip_select() {
    let (mut reader, handle) = ready_reader().await;
    handle.present_card(UID);
    handle.set_bus_fault(true);

    assert!(!reader.detect_card().await);
    assert_eq!(reader.read_uid().await, None);
    assert!(!handle.is_selected());
    let (selects, deselects) = handle.select_counts();
    assert_eq!(selects, deselects);

    handle.set_bus_fault(false);
    assert!(reader.detect_card().await);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(4)]
#[tokio::test(start_paused = true)]
async fn test_short_anticollision_reply_rejected(#[case] limit: usize) {
    let (mut reader, handle) = ready_reader().await;
    handle.present_card(UID);
    handle.truncate_replies(Some(limit));

    assert_eq!(reader.read_uid().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_one_byte_atqa_is_not_a_card() {
    let (mut reader, handle) = ready_reader().await;
    handle.present_card(UID);
    handle.truncate_replies(Some(1));

    assert!(!reader.detect_card().await);
}

proptest! {
    #[test]
    fn test_read_uid_never_partial(
        uid in any::<[u8; 4]>(),
        limit in proptest::option::of(0usize..8),
        status in prop_oneof![Just(0u8), Just(error_bits::COLLISION), Just(error_bits::CRC)],
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let read = runtime.block_on(async {
            let (mut reader, handle) = ready_reader().await;
            handle.present_card(CardUid::new(uid));
            handle.truncate_replies(limit);
            handle.set_error_status(status);
            reader.read_uid().await
        });

        let complete_reply = limit.is_none_or(|l| l >= 5);
        match read {
            Some(read) => {
                prop_assert_eq!(read, CardUid::new(uid));
                prop_assert!(complete_reply && status == 0);
            }
            None => prop_assert!(!complete_reply || status != 0),
        }
    }
}
