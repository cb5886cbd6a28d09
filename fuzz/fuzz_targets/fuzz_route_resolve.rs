//! Fuzz target: route table resolution.
//!
//! Verifies that arbitrary request paths and methods never panic the
//! resolver and that a match always names the requested path.

#![no_main]

use demo_core::{route::normalize_path, Resolution, RouteTable};
use http::Method;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path) = std::str::from_utf8(data) else {
        return;
    };
    let table = RouteTable::standard();
    for method in [Method::GET, Method::POST, Method::HEAD] {
        match table.resolve(&method, path) {
            Resolution::Matched(entry) => {
                assert!(normalize_path(path).eq_ignore_ascii_case(entry.path));
                assert_eq!(entry.method, method);
            }
            Resolution::MethodNotAllowed { allowed, .. } => {
                assert!(!allowed.contains(&method), "allowed list must exclude the request method");
            }
            Resolution::Unmatched => {}
        }
    }
});
