//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT sleep. Fragment waits are I/O waits on
//! the provider channel; timeouts use `tokio::time::timeout`.
//! **Exceptions**: replay pacing in the scripted backend, test code.

use architectural_enforcement::{find_violations, rust_files};

/// Files allowed to sleep, with the reason
const ALLOWED: [(&str, &str); 1] = [(
    "backend/scripted.rs",
    "simulated network pacing for recorded responses",
)];

const SLEEPS: [&str; 3] = ["thread::sleep", "time::sleep", "sleep_until"];

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for dir in ["itinerary/core/src", "itinerary/cli/src"] {
        for path in rust_files(dir) {
            let allowed = ALLOWED
                .iter()
                .any(|(suffix, _)| path.to_string_lossy().ends_with(suffix));
            if !allowed {
                violations.extend(find_violations(&path, &SLEEPS));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ ACCEPTABLE sleep uses:");
        for (file, reason) in ALLOWED {
            eprintln!("  - {file}: {reason}");
        }
        eprintln!("  - Test code (#[cfg(test)] modules, tests/ directories)");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_sources_were_scanned() {
    assert!(!rust_files("itinerary/core/src").is_empty());
    assert!(!rust_files("itinerary/cli/src").is_empty());
}
