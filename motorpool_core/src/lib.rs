// motorpool_core/src/lib.rs

// Vehicle entitlement and ownership tracking. Engine-agnostic: the world is
// reached only through the traits in `services` and `capabilities`.
pub mod capabilities;
pub mod error;
pub mod evaluator;
pub mod ledger;
pub mod policy;
pub mod prelude;
pub mod services;
pub mod spawner;
pub mod store;
pub mod types;
