#![no_main]
use dro_core::mocks::{MemoryStore, NullSink};
use dro_core::{Dispatcher, DroCore, PositionModel};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the handle, the rest is the payload.
    let Some((&handle, payload)) = data.split_first() else {
        return;
    };
    let mut core = DroCore::new(PositionModel::new(), MemoryStore::zeroed(), NullSink);
    core.update(i32::MAX);
    let before = core.model().clone();
    match Dispatcher::new().dispatch(&mut core, handle, payload) {
        Ok(_) => {}
        Err(_) => assert_eq!(core.model(), &before),
    }
    let m = core.model();
    assert!(m.numerator() > 0 && m.denominator() > 0);
});
