#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: &str| {
    // Any input gives either a program or a non-empty list of errors
    match monkey::parse(source) {
        Ok(program) => { let _ = program.to_string(); }
        Err(errors) => assert!(errors.len() > 0),
    }
});
