#![no_main]

//! Program loader fuzzer.
//!
//! Arbitrary bytes (ELF-looking or not) must load or be rejected with an
//! error, never panic. A successful load must start inside memory.

use libfuzzer_sys::fuzz_target;
use vsim::{VmConfig, loader};

fuzz_target!(|bytes: &[u8]| {
    let config = VmConfig {
        memory_size: 0x10000,
        memory_base: 0x10000,
        ..VmConfig::default()
    };

    if let Ok(program) = loader::load_bytes(bytes, &config) {
        assert!(program.memory.contains(program.entry()));
        for range in &program.text {
            assert!(range.start <= range.end);
        }
    }
});
