//! Client role: single-request sessions and the demo traffic generator.

pub mod session;
pub mod traffic;

pub use session::{ClientSession, FetchOutcome};

/// Writes the body lines of a delivered response to stdout.
pub fn print_body(outcome: &FetchOutcome) {
    if let FetchOutcome::Delivered { body, .. } = outcome {
        for line in body {
            println!("{}", line);
        }
    }
}
