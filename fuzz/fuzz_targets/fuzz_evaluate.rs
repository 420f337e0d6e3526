#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Map;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the split between YAML document and JSON data.
    let split = data[0] as usize % data.len();
    let (doc_bytes, data_bytes) = data.split_at(split);

    let doc = String::from_utf8_lossy(doc_bytes);
    let mut record = match rulekit::load(&doc) {
        Ok(r) => r,
        Err(_) => return,
    };

    let submitted = serde_json::from_slice::<Map<String, serde_json::Value>>(data_bytes)
        .unwrap_or_default();

    // Arbitrary documents may reference predicates that do not exist;
    // that is an error, not a panic.
    let _ = record.validate(submitted, &Map::new());
});
