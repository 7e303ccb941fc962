//! The connection's I/O loop: reads frame headers and payloads off the
//! wire, dispatches them into the stream collection, and flushes whatever
//! frames that dispatch (or a freshly submitted request) produced.
//!
//! Everything here runs on a single task. `Streams` holds no lock because
//! nothing else ever touches it concurrently -- see the concurrency notes
//! this module's callers are held to.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace};

use crate::codec::RecvError;
use crate::error::Error;
use crate::frame::{self, Frame, Head, Kind, HEADER_LEN};
use crate::hpack;

use super::streams::Streams;
use super::Config;

pub(crate) struct Connection<T> {
    io: T,
    streams: Streams,
    send_hpack: hpack::Table,
    recv_hpack: hpack::Table,
    max_frame_size: usize,
}

impl<T> Connection<T>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    pub fn new(io: T, config: Config) -> Connection<T> {
        Connection {
            io,
            streams: Streams::new(config.scheme, config.initial_window_size),
            send_hpack: hpack::Table::new(),
            recv_hpack: hpack::Table::new(),
            max_frame_size: config.max_frame_size as usize,
        }
    }

    pub fn streams_mut(&mut self) -> &mut Streams {
        &mut self.streams
    }

    /// Writes the client connection preface, required before any frames
    /// (RFC 7540 §3.5).
    pub async fn write_preface(&mut self) -> Result<(), Error> {
        const PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";
        self.io.write_all(PREFACE).await?;
        Ok(())
    }

    /// Flushes any requests submitted since the last call, then reads and
    /// applies exactly one frame from the peer. Intended to be called in a
    /// loop by the owning task.
    pub async fn tick(&mut self) -> Result<(), Error> {
        self.flush_send().await?;
        let frame = self.read_frame().await?;
        let outbound = self.dispatch(frame)?;
        self.write_frames(outbound).await?;
        Ok(())
    }

    async fn flush_send(&mut self) -> Result<(), Error> {
        let frames = self.streams.poll_send()?;
        self.write_frames(frames).await
    }

    fn dispatch(&mut self, frame: Frame) -> Result<Vec<Frame>, Error> {
        let out = match frame {
            Frame::Headers(h) => self.streams.recv_headers(h)?,
            Frame::Data(d) => self.streams.recv_data(d)?,
            Frame::Reset(r) => {
                self.streams.recv_reset(r)?;
                Vec::new()
            }
            Frame::PushPromise(p) => self.streams.recv_push_promise(p)?,
            Frame::WindowUpdate(w) => {
                self.streams.recv_window_update(w)?;
                Vec::new()
            }
        };
        Ok(out)
    }

    async fn read_frame(&mut self) -> Result<Frame, Error> {
        let mut head_buf = [0u8; HEADER_LEN];
        self.io.read_exact(&mut head_buf).await?;

        let len = u32::from_be_bytes([0, head_buf[0], head_buf[1], head_buf[2]]) as usize;
        if len > self.max_frame_size {
            return Err(RecvError::Frame(frame::Error::InvalidPayloadLength).into());
        }

        let head = Head::parse(&head_buf).map_err(RecvError::from)?;
        trace!(kind = ?head.kind(), stream_id = %head.stream_id(), len, "read frame header");

        let mut payload = BytesMut::zeroed(len);
        self.io.read_exact(&mut payload).await?;
        let payload = payload.freeze();

        self.parse_payload(head, payload)
    }

    fn parse_payload(&mut self, head: Head, payload: Bytes) -> Result<Frame, Error> {
        let frame = match head.kind() {
            Kind::Data => Frame::Data(frame::Data::load(head, payload).map_err(RecvError::from)?),
            Kind::RstStream => Frame::Reset(frame::Reset::load(head, payload).map_err(RecvError::from)?),
            Kind::WindowUpdate => {
                Frame::WindowUpdate(frame::WindowUpdate::load(head, payload).map_err(RecvError::from)?)
            }
            Kind::Headers => {
                let (pseudo, fields) = self.recv_hpack.decode(&payload).map_err(RecvError::from)?;
                let end_stream = head.flag() & 0x1 == 0x1;
                Frame::Headers(frame::Headers::from_decoded(head.stream_id(), end_stream, pseudo, fields))
            }
            Kind::PushPromise => {
                let promised_id = u32::from_be_bytes([payload[0] & 0x7f, payload[1], payload[2], payload[3]]);
                let (pseudo, fields) = self.recv_hpack.decode(&payload[4..]).map_err(RecvError::from)?;
                Frame::PushPromise(frame::PushPromise::new(
                    head.stream_id(),
                    promised_id.into(),
                    pseudo,
                    fields,
                ))
            }
        };

        Ok(frame)
    }

    async fn write_frames(&mut self, frames: Vec<Frame>) -> Result<(), Error> {
        if frames.is_empty() {
            return Ok(());
        }

        let mut buf = BytesMut::new();
        for frame in frames {
            self.encode_frame(frame, &mut buf);
        }

        self.io.write_all(&buf).await?;
        self.io.flush().await?;
        Ok(())
    }

    fn encode_frame(&mut self, frame: Frame, buf: &mut BytesMut) {
        match frame {
            Frame::Headers(h) => {
                let block = if h.is_trailers() {
                    self.send_hpack.encode_trailers(h.fields())
                } else {
                    self.send_hpack.encode_request(h.pseudo(), h.fields())
                };
                h.head().encode(block.len(), buf);
                buf.extend_from_slice(&block);
                debug!(stream_id = %h.stream_id(), "wrote HEADERS");
            }
            Frame::Data(d) => d.encode(buf),
            Frame::Reset(r) => r.encode(buf),
            Frame::WindowUpdate(w) => w.encode(buf),
            Frame::PushPromise(_) => unreachable!("client never originates PUSH_PROMISE"),
        }
    }
}
