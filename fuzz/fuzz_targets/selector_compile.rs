#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlharvest::Selector;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(selector) = Selector::compile(s) {
            let _ = selector.segments().count();
        }
    }
});
