//! Fuzz target for InboundFrame::decode and OutboundFrame::decode
//!
//! Feeds arbitrary text to both decoders to find:
//! - Panics on malformed JSON or deeply nested values
//! - Typed frames that do not survive a re-encode
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use chatwire_proto::{InboundFrame, OutboundFrame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(frame) = InboundFrame::decode(text) {
        if let InboundFrame::Unrecognized { kind } = &frame {
            assert!(!InboundFrame::KNOWN_TYPES.contains(&kind.as_str()));
            return;
        }
        let encoded = frame.encode().expect("typed frames always encode");
        assert_eq!(InboundFrame::decode(&encoded).expect("re-decode"), frame);
    }

    if let Ok(frame) = OutboundFrame::decode(text) {
        let encoded = frame.encode().expect("outbound frames always encode");
        assert_eq!(OutboundFrame::decode(&encoded).expect("re-decode"), frame);
    }
});
