//! Feed arbitrary model output to the extractor one growing prefix at a
//! time and position everything it yields against a fixed document.
//!
//! Must never panic, never yield the same issue twice, and never produce
//! overlapping spans.
#![no_main]

use libfuzzer_sys::fuzz_target;
use proofread_core::{IssueBoard, IssueExtractor};

const DOCUMENT: &str = "他慌张的穿上衣服，的确需要先登陆账号。aaa bbb ccc";

// Every prefix is fed, so keep inputs short.
const MAX_INPUT: usize = 4096;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT {
        return;
    }
    let Ok(response) = std::str::from_utf8(data) else {
        return;
    };

    let mut extractor = IssueExtractor::new();
    let mut board = IssueBoard::new(DOCUMENT);
    let mut yielded = 0;

    let cuts = response
        .char_indices()
        .map(|(i, _)| i)
        .skip(1)
        .chain(std::iter::once(response.len()));
    for cut in cuts {
        for raw in extractor.feed(&response[..cut]) {
            yielded += 1;
            let _ = board.insert_raw(raw);
        }
    }
    if let Ok(rest) = extractor.finish(response) {
        for raw in rest {
            yielded += 1;
            let _ = board.insert_raw(raw);
        }
    }

    assert_eq!(board.issues().len() + board.dropped().len(), yielded);
    let mut spans: Vec<(usize, usize)> = board.issues().iter().map(|i| (i.start, i.end)).collect();
    spans.sort_unstable();
    for pair in spans.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlapping spans {pair:?}");
    }
});
