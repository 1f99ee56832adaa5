//! Host-side tooling for the cardcrypt applet
//!
//! [`client::CardClient`] drives an applet through typed [`commands`] over any
//! [`Executor`](cardcrypt_apdu::Executor); [`config::Settings`] holds the
//! layered settings of the `cardcrypt` binary.
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod commands;
pub mod config;

pub use client::{CardClient, ClientError};
