//! Fuzz target for path patterns and tree search.
//!
//! The first line of the input is the pattern, the rest is a JSON document.
//! Tests handling of:
//! - Empty, doubled and trailing `/` segments
//! - `**` runs and glob segments against arbitrary keys
//! - Deeply nested maps and sequences with duplicate keys

#![no_main]

use libfuzzer_sys::fuzz_target;
use tpahelper_core::tree::{Node, TreeMatcher};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (pattern, document) = text.split_once('\n').unwrap_or((text, "{}"));

    let Ok(matcher) = TreeMatcher::parse(pattern) else {
        return;
    };
    let Ok(root) = serde_json::from_str::<Node>(document) else {
        return;
    };

    // Search must be deterministic and agree with its shortcuts.
    let matches = matcher.search(&root);
    assert_eq!(matches.len(), matcher.count(&root));
    assert_eq!(matcher.values(&root).len(), matches.len());
    assert_eq!(matcher.search(&root), matches);
});
