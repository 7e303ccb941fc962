//! `h2mux`: the per-stream state machine of an HTTP/2 client multiplexer.
//!
//! This crate owns one side of the RFC 7540 §5.1 stream lifecycle for a
//! single connection -- assigning stream ids, driving HEADERS/DATA/RST_STREAM
//! through the state machine, handling (and, by default, rejecting)
//! PUSH_PROMISE, and exposing a pull-based response body to the caller.
//! Connection-level concerns (SETTINGS negotiation, PING, GOAWAY, TLS, DNS)
//! are out of scope; see [`proto::Config`] for the handful of knobs this
//! crate does consult.
//!
//! ```no_run
//! # async fn doc(io: impl tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + 'static) -> Result<(), h2mux::Error> {
//! let (send_request, connector) = h2mux::client::handshake(io).await?;
//! tokio::task::spawn_local(connector.run());
//!
//! let request = http::Request::builder()
//!     .uri("https://example.com/")
//!     .body(())
//!     .unwrap();
//! let mut response = send_request.send(request).await?;
//!
//! while let Some(chunk) = response.body_mut().data().await {
//!     let _chunk = chunk?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod frame;
pub mod hpack;
pub(crate) mod proto;

pub use crate::client::{handshake, handshake_with_config, Connector, RecvStream, SendRequest};
pub use crate::error::Error;
pub use crate::proto::Config;
