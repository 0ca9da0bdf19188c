#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::record::keys::attribute_cache_key;
use domain::task::entity::Task;

// Queue payloads come from other processes. Decoding arbitrary bytes and
// deriving the dedup key from whatever decodes must never panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(task) = serde_json::from_slice::<Task>(data) {
        let hash = task.attribute.hash();
        assert_eq!(hash.len(), 64);
        let _ = attribute_cache_key(&task.report_id, &task.attribute);
        let _ = serde_json::to_vec(&task);
    }
});
