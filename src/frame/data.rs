use bytes::{BufMut, Bytes};

use super::{Error, Head, Kind, StreamId};

const END_STREAM: u8 = 0x1;
const PADDED: u8 = 0x8;

/// DATA frame (RFC 7540 §6.1). Carries a slice of the response or request
/// body.
#[derive(Debug)]
pub struct Data {
    stream_id: StreamId,
    payload: Bytes,
    flags: u8,
}

impl Data {
    pub fn new(stream_id: StreamId, payload: Bytes) -> Data {
        Data {
            stream_id,
            payload,
            flags: 0,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_end_stream(&self) -> bool {
        self.flags & END_STREAM == END_STREAM
    }

    pub fn set_end_stream(&mut self, val: bool) {
        if val {
            self.flags |= END_STREAM;
        } else {
            self.flags &= !END_STREAM;
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Length counted against flow control, including any padding this
    /// frame carried on the wire. This crate never emits padding, so for
    /// locally-constructed frames this equals `payload.len()`.
    pub fn flow_controlled_len(&self) -> usize {
        self.payload.len()
    }

    pub fn load(head: Head, payload: Bytes) -> Result<Data, Error> {
        debug_assert_eq!(head.kind(), Kind::Data);

        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        let padded = head.flag() & PADDED == PADDED;
        let payload = super::util::strip_padding(payload, padded)?;

        Ok(Data {
            stream_id: head.stream_id(),
            payload,
            flags: head.flag() & END_STREAM,
        })
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        let head = Head::new(Kind::Data, self.flags, self.stream_id);
        head.encode(self.payload.len(), dst);
        dst.put(self.payload.clone());
    }
}
