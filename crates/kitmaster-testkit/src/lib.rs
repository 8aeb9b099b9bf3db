//! # KitMaster Testkit
//!
//! Testing utilities for KitMaster.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a [`TestFixture`] wiring a `KitMaster` to recording
//!   collaborators and a manual clock
//! - **Generators**: Proptest strategies for kits, attribute tables and
//!   permission scenarios
//! - **Tracing**: [`init_tracing`] routes log output through the test harness
//!
//! The collaborator mocks themselves live in `kitmaster::testing` and are
//! re-exported here.
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use kitmaster_testkit::generators::LatticeScenario;
//!
//! proptest! {
//!     #[test]
//!     fn leaf_resolves(scenario: LatticeScenario) {
//!         let registry = scenario.registry();
//!         prop_assert!(registry.get(&scenario.leaf().name).is_some());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use kitmaster::GrantContext;
//! use kitmaster_testkit::fixtures::{warrior_family, TestFixture};
//!
//! let fixture = TestFixture::new().with_kits(warrior_family());
//! let steve = fixture.principal("Steve", &["kit.cmd.Warrior"]);
//! let result = fixture.give(&steve, "Warrior", GrantContext::CommandTaken);
//! assert!(result.is_success());
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{warrior_family, TestFixture};
pub use generators::LatticeScenario;
pub use kitmaster::testing::{
    InventoryOp, MockEconomy, MockPermissions, RecordingInventory, ScriptedInterceptor, TestPrincipal,
};

use tracing_subscriber::filter::LevelFilter;

/// Send `tracing` output to the test harness at debug level.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}
