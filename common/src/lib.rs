//! Common types used throughout the administration scripts, independent of any
//! network connection

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod constants;
pub mod credentials;
pub mod types;
