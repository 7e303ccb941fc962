use http::{HeaderMap, Method, StatusCode};

use super::{Head, Kind, StreamId};

const END_STREAM: u8 = 0x1;
const END_HEADERS: u8 = 0x4;

/// The pseudo-headers carried by a HEADERS or PUSH_PROMISE block (RFC 7540
/// §8.1.2.3). Request and response pseudo-headers are kept in the same
/// struct since which subset is populated depends on which side of the
/// exchange this frame represents.
#[derive(Debug, Default, Clone)]
pub struct Pseudo {
    pub method: Option<Method>,
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: Option<String>,
    pub status: Option<StatusCode>,
}

impl Pseudo {
    pub fn request(method: Method, scheme: &str, authority: &str, path: &str) -> Pseudo {
        Pseudo {
            method: Some(method),
            scheme: Some(scheme.to_owned()),
            authority: Some(authority.to_owned()),
            path: Some(path.to_owned()),
            status: None,
        }
    }

    pub fn response(status: StatusCode) -> Pseudo {
        Pseudo {
            status: Some(status),
            ..Pseudo::default()
        }
    }

    /// A header block with no request or response pseudo-headers is a
    /// trailer block (RFC 7540 §8.1.3 treats trailers as a HEADERS frame
    /// carrying only regular fields).
    pub fn is_trailers(&self) -> bool {
        self.method.is_none() && self.status.is_none()
    }
}

/// HEADERS frame (RFC 7540 §6.2). Also used for trailers (a second HEADERS
/// frame carrying END_STREAM and no request/response pseudo-headers).
#[derive(Debug)]
pub struct Headers {
    stream_id: StreamId,
    pseudo: Pseudo,
    fields: HeaderMap,
    flags: u8,
}

impl Headers {
    pub fn new(stream_id: StreamId, pseudo: Pseudo, fields: HeaderMap) -> Headers {
        Headers {
            stream_id,
            pseudo,
            fields,
            flags: END_HEADERS,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn pseudo(&self) -> &Pseudo {
        &self.pseudo
    }

    pub fn fields(&self) -> &HeaderMap {
        &self.fields
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

    pub fn is_trailers(&self) -> bool {
        self.pseudo.is_trailers()
    }

    pub fn into_parts(self) -> (Pseudo, HeaderMap) {
        (self.pseudo, self.fields)
    }

    pub fn head(&self) -> Head {
        Head::new(Kind::Headers, self.flags, self.stream_id)
    }

    /// Assembles a `Headers` frame from an already-HPACK-decoded pseudo +
    /// field set (decoding itself is `hpack::Table`'s job -- this module only
    /// models the frame, not the compression).
    pub fn from_decoded(stream_id: StreamId, end_stream: bool, pseudo: Pseudo, fields: HeaderMap) -> Headers {
        let mut h = Headers::new(stream_id, pseudo, fields);
        h.set_end_stream(end_stream);
        h
    }
}

/// PUSH_PROMISE frame (RFC 7540 §6.6). Reserves `promised_id` and carries
/// the pseudo-headers of the request the server intends to answer.
#[derive(Debug)]
pub struct PushPromise {
    stream_id: StreamId,
    promised_id: StreamId,
    pseudo: Pseudo,
    fields: HeaderMap,
}

impl PushPromise {
    pub fn new(stream_id: StreamId, promised_id: StreamId, pseudo: Pseudo, fields: HeaderMap) -> PushPromise {
        PushPromise {
            stream_id,
            promised_id,
            pseudo,
            fields,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn promised_id(&self) -> StreamId {
        self.promised_id
    }

    pub fn into_parts(self) -> (Pseudo, HeaderMap) {
        (self.pseudo, self.fields)
    }
}
