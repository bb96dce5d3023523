#![cfg(feature = "hardware")]

use dro_hardware::hardware::HardwareCounter;
use dro_traits::Counter;

// Needs an LS7366R on SPI0/CE0; the encoder must be idle during the test.

#[test]
#[ignore = "requires LS7366R wiring"]
fn clear_then_read_is_zero() {
    let mut c = HardwareCounter::try_new(0, 0, 1_000_000).expect("open ls7366");
    c.clear().expect("clear");
    assert_eq!(c.read().expect("read"), 0);
}
