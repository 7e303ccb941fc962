use bytes::{Buf, Bytes};

use super::Error;

/// Strips an RFC 7540 §6.1/§6.2 padding prefix from a DATA or HEADERS
/// payload when the PADDED flag is set. Returns the un-padded payload.
pub fn strip_padding(mut payload: Bytes, padded: bool) -> Result<Bytes, Error> {
    if !padded {
        return Ok(payload);
    }

    if payload.is_empty() {
        return Err(Error::InvalidPayloadLength);
    }

    let pad_len = payload[0] as usize;
    payload.advance(1);

    if pad_len > payload.len() {
        return Err(Error::InvalidPayloadLength);
    }

    payload.truncate(payload.len() - pad_len);
    Ok(payload)
}
