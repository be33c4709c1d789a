#![doc(test(attr(deny(warnings))))]

//! Bean Compose builds plain-text double-entry ledger entries interactively,
//! inserts them in date order and keeps ledger files aligned and consistent.

pub mod align;
pub mod cli;
pub mod compose;
pub mod config;
pub mod dates;
pub mod errors;
pub mod ledger;
pub mod matching;
pub mod position;
pub mod prompt;
pub mod split;
pub mod template;
pub mod utils;
pub mod writer;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing once per process.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("bean-compose tracing initialized");
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
