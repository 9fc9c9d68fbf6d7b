#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlharvest::{ExtractConfig, Selector, XmlReader};

// First line is the selector, the rest is the document
fuzz_target!(|data: &[u8]| {
    let Some(split) = data.iter().position(|&b| b == b'\n') else {
        return;
    };
    let (head, body) = data.split_at(split);
    let Ok(expression) = std::str::from_utf8(head) else {
        return;
    };
    let Ok(selector) = Selector::compile(expression) else {
        return;
    };

    let reader = XmlReader::from_reader(&body[1..]);
    for fragment in selector.extract_with_config(reader, ExtractConfig::new(64, 1 << 16)) {
        if fragment.is_err() {
            break;
        }
    }
});
