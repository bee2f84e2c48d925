//! Fuzz target for inbound frame and history decoding
//!
//! Feeds arbitrary bytes to the channel and history decoders to find:
//! - Parser panics on hostile JSON
//! - Timestamp strings that slip past validation
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use huddle_proto::codec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(message) = codec::decode_inbound(text) {
        // Anything accepted must re-encode as an outgoing frame
        let _ = codec::encode_outgoing(&message.content);
    }
    let _ = codec::decode_history(text);
});
