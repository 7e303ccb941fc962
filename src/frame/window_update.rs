use bytes::{Buf, BufMut, Bytes};

use super::{Error, Head, Kind, StreamId};

/// WINDOW_UPDATE frame (RFC 7540 §6.9). Emitted when a stream's recv window
/// is refilled after the application releases capacity.
#[derive(Debug, Clone, Copy)]
pub struct WindowUpdate {
    stream_id: StreamId,
    size_increment: u32,
}

impl WindowUpdate {
    pub fn new(stream_id: StreamId, size_increment: u32) -> WindowUpdate {
        WindowUpdate {
            stream_id,
            size_increment,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn size_increment(&self) -> u32 {
        self.size_increment
    }

    pub fn load(head: Head, payload: Bytes) -> Result<WindowUpdate, Error> {
        debug_assert_eq!(head.kind(), Kind::WindowUpdate);

        if payload.len() != 4 {
            return Err(Error::InvalidPayloadLength);
        }

        let increment = (&payload[..]).get_u32() & !(1 << 31);

        Ok(WindowUpdate::new(head.stream_id(), increment))
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        let head = Head::new(Kind::WindowUpdate, 0, self.stream_id);
        head.encode(4, dst);
        dst.put_u32(self.size_increment & !(1 << 31));
    }
}
