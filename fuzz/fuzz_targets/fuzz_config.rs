#![no_main]

use libfuzzer_sys::fuzz_target;

use infrastructure::config::AgentConfig;

// Arbitrary YAML through AgentConfig::from_yaml, which also validates.
// Must return Ok or Err, never panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data)
        && yaml.len() <= 64 * 1024
    {
        if let Ok(config) = AgentConfig::from_yaml(yaml) {
            let _ = config.sanitized();
            let _ = config.record_ttl();
        }
    }
});
