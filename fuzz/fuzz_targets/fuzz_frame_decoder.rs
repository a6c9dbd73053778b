//! Fuzz target: `FrameDecoder::feed` + `decode_frame`
//!
//! Drives arbitrary byte sequences through the line decoder and decodes
//! every line it yields.  Neither may panic, and no yielded line may be
//! empty or exceed the frame limit.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use cheesecave::rpc::codec::{FrameDecoder, MAX_FRAME_SIZE, decode_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();

    decoder.feed(data, |line| {
        assert!(!line.is_empty(), "decoder must not yield empty lines");
        assert!(line.len() < MAX_FRAME_SIZE, "line exceeds MAX_FRAME_SIZE");
        let _ = decode_frame(line);
    });

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    decoder.feed(data, |_| {});
});
