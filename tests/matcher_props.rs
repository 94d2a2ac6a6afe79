//! Property tests for the stream matcher and the close-marker read path.

mod common;

use common::{open_connection, ScriptedModule};
use proptest::prelude::*;
use std::time::Duration;
use wifly_driver::protocol::{find, find_any, SliceSource};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Patterns whose first byte does not recur later in the pattern.
fn restartable_pattern() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"abcd".to_vec()), 1..6).prop_filter(
        "first byte must be unique",
        |p| !p[1..].contains(&p[0]),
    )
}

proptest! {
    #[test]
    fn find_matches_substrings(
        haystack in prop::collection::vec(prop::sample::select(b"abcd".to_vec()), 0..64),
        pattern in restartable_pattern(),
    ) {
        let mut src = SliceSource::new(&haystack);
        let found = find(&mut src, &pattern, Duration::ZERO).unwrap();
        prop_assert_eq!(found, contains(&haystack, &pattern));
    }

    #[test]
    fn find_any_reports_earliest_completion(
        haystack in prop::collection::vec(prop::sample::select(b"AOKER: \r\n".to_vec()), 0..48),
    ) {
        let patterns: [&[u8]; 2] = [b"ERR: ", b"AOK\r\n"];
        let mut src = SliceSource::new(&haystack);
        let winner = find_any(&mut src, &patterns, Duration::ZERO).unwrap();

        let end_of = |p: &[u8]| {
            haystack
                .windows(p.len())
                .position(|w| w == p)
                .map(|start| start + p.len())
        };
        let expected = match (end_of(patterns[0]), end_of(patterns[1])) {
            (Some(a), Some(b)) => Some(if a <= b { 0 } else { 1 }),
            (Some(_), None) => Some(0),
            (None, Some(_)) => Some(1),
            (None, None) => None,
        };
        prop_assert_eq!(winner, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Anything short of a full close marker reaches the caller unchanged.
    #[test]
    fn partial_close_markers_are_delivered(
        payload in prop::collection::vec(prop::sample::select(b"*CLOSx".to_vec()), 1..24)
            .prop_filter("no full marker", |p| !contains(p, b"*CLOS*")),
    ) {
        let module = ScriptedModule::new();
        let mut wifly = module.driver();
        open_connection(&module, &mut wifly);
        module.receive(&payload);

        let mut delivered = Vec::new();
        while let Some(b) = wifly.read_byte().unwrap() {
            delivered.push(b);
        }

        prop_assert_eq!(delivered, payload);
        prop_assert!(wifly.is_connected());
    }

    /// A real close marker ends the payload at its first occurrence, however
    /// many stray `*` and partial markers come before it.
    #[test]
    fn close_marker_after_partial_markers(
        prefix in prop::collection::vec(prop::sample::select(b"*CLOSx".to_vec()), 0..24),
    ) {
        let module = ScriptedModule::new();
        let mut wifly = module.driver();
        open_connection(&module, &mut wifly);

        let mut stream = prefix.clone();
        stream.extend_from_slice(b"*CLOS*");
        let end = stream
            .windows(6)
            .position(|w| w == b"*CLOS*")
            .unwrap_or(prefix.len());
        module.receive(&stream);

        let mut delivered = Vec::new();
        while let Some(b) = wifly.read_byte().unwrap() {
            delivered.push(b);
        }

        prop_assert_eq!(&delivered[..], &stream[..end]);
        prop_assert!(!wifly.is_connected());
    }
}
