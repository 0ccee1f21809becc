//! Tienda command-line client.
//!
//! The `tienda` binary parses arguments and hands off to [`commands`].
//! Cart commands keep the held cart ID in a [`store::FileCartStore`], so it
//! survives from one invocation to the next.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commands;
pub mod output;
pub mod store;
