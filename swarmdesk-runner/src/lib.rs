//! SwarmDesk Runner: desk orchestration on top of `swarmdesk-core`.
//!
//! This crate provides:
//! - TOML desk configuration and the tradable symbol universe
//! - The `Desk`: one tick monitors every agent, rotates news and scans
//! - Per-agent in-flight guard so a slow scan never overlaps itself
//! - Candidate scanning with seeded gating and ordering
//! - Bounded event journal, CSV trade export and JSON snapshots

pub mod config;
pub mod desk;
pub mod error;
pub mod guard;
pub mod journal;
pub mod scanner;
pub mod snapshot;
pub mod universe;

pub use config::{ConfigError, DataMode, DeskConfig, DeskSettings, PersonaEntry};
pub use desk::{Desk, Evaluation, TickReport};
pub use error::DeskError;
pub use guard::{InFlight, InFlightGuard, OwnedInFlightGuard};
pub use journal::{EntryKind, Journal, JournalEntry};
pub use scanner::{ScanOutcome, Scanner};
pub use snapshot::{DeskSnapshot, SCHEMA_VERSION};
pub use universe::Universe;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn desk_is_send_sync() {
        assert_send::<Desk>();
        assert_sync::<Desk>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<DeskConfig>();
        assert_sync::<DeskConfig>();
        assert_send::<Universe>();
        assert_sync::<Universe>();
    }

    #[test]
    fn journal_is_send_sync() {
        assert_send::<Journal>();
        assert_sync::<Journal>();
    }

    #[test]
    fn snapshot_is_send_sync() {
        assert_send::<DeskSnapshot>();
        assert_sync::<DeskSnapshot>();
    }

    #[test]
    fn guard_is_sync() {
        assert_sync::<InFlight>();
    }

    #[test]
    fn scanner_is_sync() {
        assert_sync::<Scanner<'static>>();
    }
}
