//! Integration scenarios.

#[cfg(test)]
mod fixtures;

pub mod responder;
pub mod routing;
pub mod rpc;
pub mod two_phase;
