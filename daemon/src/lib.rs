// Meridian Daemon Library
// Exposes internal modules for the binary and integration tests

#![allow(clippy::type_complexity)]
#![allow(clippy::uninlined_format_args)]

extern crate log;

pub mod config;
pub mod core;
pub mod rpc;
