//! Property-based tests for the channel frame codec.

use huddle_proto::{
    Content, Message, StoredFile, Timestamp,
    codec::{decode_inbound, encode_outgoing},
};
use proptest::prelude::*;

fn content_strategy() -> impl Strategy<Value = Content> {
    prop_oneof![
        ".{0,64}".prop_map(Content::text),
        ("/uploads/[a-z0-9]{1,12}\\.[a-z]{2,4}", ".{1,32}", "(image|text|application)/[a-z]{2,8}")
            .prop_map(|(file_url, file_name, file_type)| Content::File(StoredFile {
                file_url,
                file_name,
                file_type,
            })),
    ]
}

proptest! {
    /// A server echo of an outgoing body decodes back to the same body.
    #[test]
    fn prop_echoed_frame_preserves_content(
        content in content_strategy(),
        sender_id in any::<u64>(),
        secs in 0i64..4_000_000_000,
    ) {
        let encoded = encode_outgoing(&content).unwrap();
        let mut object: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        let time = Timestamp::new(chrono::DateTime::from_timestamp(secs, 0).unwrap());
        object["sender_id"] = sender_id.into();
        object["time"] = time.to_string().into();

        let message: Message = decode_inbound(&object.to_string()).unwrap();
        prop_assert_eq!(message.content, content);
        prop_assert_eq!(message.sender_id, sender_id);
        prop_assert_eq!(message.time, time);
    }

    /// Arbitrary input never panics the decoder.
    #[test]
    fn prop_decode_never_panics(raw in ".{0,256}") {
        let _ = decode_inbound(&raw);
    }
}
