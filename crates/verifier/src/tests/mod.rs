//! End-to-end verification tests against simulated chains.
//!
//! Tests requiring Anvil are marked with `#[ignore]` for CI compatibility.


mod integration;
