#![doc(test(attr(deny(warnings))))]

//! Student Form implements a student-information form without a display
//! toolkit: field validation, debounced draft autosave into a key-value
//! slot, single-slot notifications and the submit/confirm lifecycle, all
//! behind capabilities that tests can replace.

pub mod cli;
pub mod config;
pub mod controller;
pub mod draft;
pub mod errors;
pub mod form;
pub mod notifier;
pub mod report;
pub mod scheduler;
pub mod storage;
pub mod submission;
pub mod utils;
pub mod validation;
pub mod view;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Student form tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
