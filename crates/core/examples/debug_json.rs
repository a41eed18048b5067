//! Print the JSON shapes the frontend receives for a canned check.
//!
//!   cargo run -p proofread-core --example debug_json

use proofread_core::{ProofreadSession, StreamOutcome, StreamTiming, UserAction};
use std::time::Duration;

const RESPONSE: &str = r#"{"issues":[
  {"original":"的","suggestion":"地","reason":"状语后用“地”","category":"语法错误"},
  {"original":"登陆","suggestion":"登录","reason":"“登录”指进入系统","category":"错别字"},
  {"original":"。。","suggestion":"。","reason":"重复句号","category":"标点符号"}
]}"#;

fn main() {
    let mut session = ProofreadSession::new("他慌张的穿上衣服，需要先登陆账号。。");
    session.begin();
    session.ingest(RESPONSE);
    session
        .complete(StreamOutcome {
            content: RESPONSE.to_string(),
            timing: StreamTiming {
                first_byte: Some(Duration::from_millis(420)),
                total: Duration::from_millis(1800),
            },
        })
        .unwrap();
    session.apply(UserAction::Accept(2));

    println!("{}", serde_json::to_string_pretty(session.board().issues()).unwrap());
    println!("{}", serde_json::to_string_pretty(&session.summary()).unwrap());
    let entry = session.history_entry("2026-10-18T09:30:00.000Z").unwrap();
    println!("{}", serde_json::to_string_pretty(&entry).unwrap());
}
