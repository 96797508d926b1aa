//! Scripts for administering a deployed staking network: changing settings,
//! registering groups, minting, funding and depositing.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cli;
pub mod client;
pub mod coercion;
pub mod commands;
pub mod constants;
pub mod dispatcher;
pub mod errors;
pub mod invoker;
pub mod registry;
pub mod resolver;
pub mod submitter;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_helpers;
