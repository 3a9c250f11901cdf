//! Fuzz target for envelope decoding
//!
//! Feeds arbitrary bytes to `Envelope::decode`. Decoding must never panic,
//! and anything it accepts must re-encode into bytes that decode again
//! with the same identity and write time.
//!
//! Run with: cargo +nightly fuzz run envelope_decode -- -max_total_time=60

#![no_main]

use leadcache_core::Envelope;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(envelope) = Envelope::decode(data) else {
        return;
    };

    let bytes = envelope
        .to_bytes()
        .expect("a decoded envelope always re-encodes");
    let again = Envelope::decode(&bytes).expect("re-encoded envelope must decode");
    assert_eq!(again.identity, envelope.identity);
    assert_eq!(again.written_at, envelope.written_at);
    assert_eq!(again.payload.len(), envelope.payload.len());
});
