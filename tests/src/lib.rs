//! # Embed-Relay Test Suite
//!
//! Cross-crate scenarios driving real registries, embed instances and
//! scripted frames together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── routing.rs     # embedId demultiplexing, origin checks, teardown
//!     ├── rpc.rs         # trigger settlement: reply, error, timeout, reload
//!     ├── two_phase.rs   # start/end delivery rules
//!     └── responder.rs   # host answering remote requests
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo test -p relay-tests integration::rpc::
//! ```

pub mod integration;
