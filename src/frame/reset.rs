use bytes::{Buf, BufMut, Bytes};

use super::{Error, Head, Kind, Reason, StreamId};

/// RST_STREAM frame (RFC 7540 §6.4). Aborts a stream without affecting the
/// rest of the connection.
#[derive(Debug, Clone, Copy)]
pub struct Reset {
    stream_id: StreamId,
    error_code: Reason,
}

impl Reset {
    pub fn new(stream_id: StreamId, error_code: Reason) -> Reset {
        Reset {
            stream_id,
            error_code,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn reason(&self) -> Reason {
        self.error_code
    }

    pub fn load(head: Head, payload: Bytes) -> Result<Reset, Error> {
        debug_assert_eq!(head.kind(), Kind::RstStream);

        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        if payload.len() != 4 {
            return Err(Error::InvalidPayloadLength);
        }

        let code = (&payload[..]).get_u32();

        Ok(Reset::new(head.stream_id(), Reason::new(code)))
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        let head = Head::new(Kind::RstStream, 0, self.stream_id);
        head.encode(4, dst);
        dst.put_u32(self.error_code.code());
    }
}
