//! Blocking client for the [RCON](https://wiki.vg/RCON) remote console
//! protocol as spoken by Minecraft-family dedicated servers.
//!
//! The crate covers the whole protocol engine: binary packet framing,
//! request/response correlation, the authentication handshake (including
//! the spurious-response quirk some servers exhibit), and three
//! interchangeable strategies for detecting the end of a fragmented
//! command response. See [`FragmentStrategy`] for the trade-offs.
//!
//! The quickest path is the [`RconClient`] convenience wrapper:
//!
//! ```no_run
//! use mc_rcon::RconClient;
//!
//! fn main() -> mc_rcon::errors::Result<()> {
//!     let client = RconClient::connect("localhost", 25575, "password")?;
//!     let output = client.command("list")?;
//!     println!("{output}");
//!     client.close()
//! }
//! ```
//!
//! Callers that manage their own sockets can attach a [`Rcon`] session to
//! any connected [`Transport`](transport::Transport) instead.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

pub mod client;
pub mod codec;
pub mod errors;
pub mod fragment;
mod framing;
pub mod packet;
mod session;
pub mod transport;

pub use client::RconClient;
pub use codec::Charset;
pub use fragment::FragmentStrategy;
pub use session::{Rcon, RconBuilder, DEFAULT_FRAGMENT_TIMEOUT, DEFAULT_READ_TIMEOUT};
