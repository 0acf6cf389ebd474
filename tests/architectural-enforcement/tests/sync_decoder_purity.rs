//! Integration Test: Synchronous Decoder
//!
//! **Policy**: The decoding modules are plain state machines driven one
//! fragment at a time by their caller. They MUST NOT touch the async runtime,
//! spawn work, block, or sleep. Waiting for fragments belongs to the session
//! driver in `streaming/`.

use architectural_enforcement::{find_violations, workspace_root};

const SYNC_MODULES: [&str; 6] = [
    "itinerary/core/src/sentinel.rs",
    "itinerary/core/src/decoder.rs",
    "itinerary/core/src/sanitize.rs",
    "itinerary/core/src/payload.rs",
    "itinerary/core/src/category.rs",
    "itinerary/core/src/session.rs",
];

const FORBIDDEN: [&str; 9] = [
    "tokio",
    "async ",
    ".await",
    "std::thread",
    "spawn(",
    "sleep(",
    "Mutex",
    "RwLock",
    "mpsc",
];

#[test]
fn test_decoding_modules_are_synchronous() {
    let mut violations = Vec::new();

    for module in SYNC_MODULES {
        let path = workspace_root().join(module);
        assert!(path.exists(), "missing decoding module {module}");
        violations.extend(find_violations(&path, &FORBIDDEN));
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Async or blocking constructs found in decoding modules:\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Move waiting, timeouts and cancellation into streaming::SessionDriver");

        panic!(
            "\nFound {} violation(s) in synchronous decoding modules.",
            violations.len()
        );
    }
}
