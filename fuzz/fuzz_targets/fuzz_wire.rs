#![no_main]

use libfuzzer_sys::fuzz_target;
use myrmidon::net::codec::decode;

// The wire codec must never panic on arbitrary bytes; malformed frames are
// dropped by returning a `DecodeError`, never by panicking.
fuzz_target!(|data: &[u8]| {
    let _ = decode(data);
});
