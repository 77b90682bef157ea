#![doc(test(attr(deny(warnings))))]

//! Duebook Core keeps the books of small tuition institutes and shops: course fee
//! planning, due/advance balances with an append-only payment history, JSON
//! persistence, and a best-effort notification feed for account holders.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod sync;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Duebook Core tracing initialized.");
    });
}
