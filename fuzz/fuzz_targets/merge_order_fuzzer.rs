//! Fuzz target for the history/live merge
//!
//! Interleaves history completion, live frames and a channel close in an
//! arbitrary order and checks that the visible sequence:
//! - contains every live frame that arrived after history settled, in order
//! - is unaffected by completions tagged with a stale generation

#![no_main]

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use huddle_app::{App, AppConfig, AppEvent};
use huddle_proto::{Content, Message, Timestamp};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Live { sender: u8, minute: u8 },
    HistoryLoaded { count: u8 },
    HistoryFailed,
    Closed,
    Stale { sender: u8 },
}

fn message(sender: u8, minute: u8) -> Message {
    let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default()
        + chrono::Duration::minutes(i64::from(minute));
    Message {
        sender_id: u64::from(sender),
        sender: None,
        time: Timestamp::new(time),
        content: Content::text(format!("m{minute}")),
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut app = App::new(AppConfig::default());
    let _ = app.open_group(1);
    let generation = app.generation();

    let mut settled = false;
    let mut after_settle = Vec::new();

    for op in ops {
        match op {
            Op::Live { sender, minute } => {
                let msg = message(sender, minute);
                if settled {
                    after_settle.push(msg.clone());
                }
                let _ = app.handle(AppEvent::FrameReceived { generation, message: msg });
            },
            Op::HistoryLoaded { count } if !settled => {
                let messages = (0..count).map(|i| message(0, i)).collect();
                let _ = app.handle(AppEvent::HistoryLoaded { generation, messages });
                settled = true;
            },
            Op::HistoryFailed if !settled => {
                let _ = app.handle(AppEvent::HistoryFailed { generation, reason: "fuzz".into() });
                settled = true;
            },
            Op::HistoryLoaded { .. } | Op::HistoryFailed => {},
            Op::Closed => {
                let _ = app.handle(AppEvent::ChannelClosed { generation });
            },
            Op::Stale { sender } => {
                let before = app.messages().len();
                let _ = app.handle(AppEvent::FrameReceived {
                    generation: generation.wrapping_sub(1),
                    message: message(sender, 0),
                });
                assert_eq!(app.messages().len(), before);
            },
        }
    }

    let visible = app.messages();
    if settled {
        assert!(visible.ends_with(&after_settle));
    } else {
        assert!(visible.is_empty());
    }
});
