//! Fuzz target for YAML scan configuration parsing and validation.
//!
//! Run with:
//!   cargo +nightly fuzz run scan_config_parse

#![no_main]

use codescan::config::ScanConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(yaml) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = ScanConfig::from_yaml_str(yaml) {
        let _ = config.validate();
    }
});
