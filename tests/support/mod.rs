//! A minimal fake peer for driving `h2mux` end to end over an in-memory
//! duplex pipe, playing the server side of the handshake by hand: read the
//! preface, then read and write raw frames using the same `frame`/`hpack`
//! types the crate itself uses to build them.

use bytes::{Bytes, BytesMut};
use h2mux::frame::{self, Frame, Head, Kind, Pseudo, HEADER_LEN};
use h2mux::hpack;
use http::HeaderMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub fn pipe() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(64 * 1024)
}

pub struct FakePeer {
    io: DuplexStream,
    send_hpack: hpack::Table,
    recv_hpack: hpack::Table,
}

impl FakePeer {
    pub fn new(io: DuplexStream) -> FakePeer {
        FakePeer {
            io,
            send_hpack: hpack::Table::new(),
            recv_hpack: hpack::Table::new(),
        }
    }

    pub async fn expect_preface(&mut self) {
        let mut buf = [0u8; 24];
        self.io.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n");
    }

    pub async fn read_frame(&mut self) -> Frame {
        let mut head_buf = [0u8; HEADER_LEN];
        self.io.read_exact(&mut head_buf).await.unwrap();
        let len = u32::from_be_bytes([0, head_buf[0], head_buf[1], head_buf[2]]) as usize;
        let head = Head::parse(&head_buf).unwrap();

        let mut payload = BytesMut::zeroed(len);
        self.io.read_exact(&mut payload).await.unwrap();
        let payload = payload.freeze();

        match head.kind() {
            Kind::Data => Frame::Data(frame::Data::load(head, payload).unwrap()),
            Kind::RstStream => Frame::Reset(frame::Reset::load(head, payload).unwrap()),
            Kind::WindowUpdate => Frame::WindowUpdate(frame::WindowUpdate::load(head, payload).unwrap()),
            Kind::Headers => {
                let (pseudo, fields) = self.recv_hpack.decode(&payload).unwrap();
                let end_stream = head.flag() & 0x1 == 0x1;
                Frame::Headers(frame::Headers::from_decoded(head.stream_id(), end_stream, pseudo, fields))
            }
            Kind::PushPromise => unreachable!("fake peer never receives PUSH_PROMISE"),
        }
    }

    /// Reads frames until one matching `Kind::Headers` or `Kind::RstStream`
    /// is seen, skipping WINDOW_UPDATE acks the client may interleave.
    pub async fn read_headers(&mut self) -> frame::Headers {
        loop {
            match self.read_frame().await {
                Frame::Headers(h) => return h,
                Frame::WindowUpdate(_) => continue,
                other => panic!("expected HEADERS, got {other:?}"),
            }
        }
    }

    pub async fn send_response_headers(&mut self, stream_id: u32, status: u16, end_stream: bool) {
        let pseudo = Pseudo::response(http::StatusCode::from_u16(status).unwrap());
        let block = self.send_hpack.encode_response(&pseudo, &HeaderMap::new());
        let mut buf = BytesMut::new();
        let flags = if end_stream { 0x5 } else { 0x4 };
        Head::new(Kind::Headers, flags, stream_id.into()).encode(block.len(), &mut buf);
        buf.extend_from_slice(&block);
        self.io.write_all(&buf).await.unwrap();
    }

    pub async fn send_data(&mut self, stream_id: u32, payload: &[u8], end_stream: bool) {
        let mut data = frame::Data::new(stream_id.into(), Bytes::copy_from_slice(payload));
        data.set_end_stream(end_stream);
        let mut buf = BytesMut::new();
        data.encode(&mut buf);
        self.io.write_all(&buf).await.unwrap();
    }

    pub async fn send_reset(&mut self, stream_id: u32, reason: frame::Reason) {
        let reset = frame::Reset::new(stream_id.into(), reason);
        let mut buf = BytesMut::new();
        reset.encode(&mut buf);
        self.io.write_all(&buf).await.unwrap();
    }

    pub async fn send_push_promise(&mut self, parent_id: u32, promised_id: u32, method: &str, path: &str) {
        let pseudo = Pseudo::request(method.parse().unwrap(), "https", "example.com", path);
        let block = self.send_hpack.encode_request(&pseudo, &HeaderMap::new());

        let mut buf = BytesMut::new();
        Head::new(Kind::PushPromise, 0x4, parent_id.into()).encode(4 + block.len(), &mut buf);
        buf.extend_from_slice(&(promised_id & !(1 << 31)).to_be_bytes());
        buf.extend_from_slice(&block);
        self.io.write_all(&buf).await.unwrap();
    }
}
