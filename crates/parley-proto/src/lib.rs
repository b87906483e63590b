//! Parley wire protocol
//!
//! Every event exchanged with the room server travels as a [`Frame`]: a fixed
//! 16-byte binary [`FrameHeader`] followed by a CBOR payload. The header names
//! the [`EventKind`] so a receiver can reject unknown or oversized frames
//! before touching the payload.
//!
//! # Components
//!
//! - [`FrameHeader`]: Zero-copy binary header (magic, version, kind, sequence, size)
//! - [`Frame`]: Header plus raw payload bytes
//! - [`ClientEvent`]: Events the client sends (join, message, image, status)
//! - [`ServerEvent`]: Events the server broadcasts to the client

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod events;
mod frame;
mod header;
mod kind;

pub use errors::ProtocolError;
pub use events::{ClientEvent, PresenceStatus, ServerEvent};
pub use frame::Frame;
pub use header::FrameHeader;
pub use kind::EventKind;
