//! HPACK header compression (RFC 7541), wrapping the third-party codec with
//! the pseudo-header/regular-field split the stream layer works in terms of.
//!
//! Encoding and decoding both keep one dynamic table per connection
//! direction, matching the protocol's requirement that the table evolve
//! across the lifetime of the connection rather than per-stream.

use bytes::Bytes;
use fluke_hpack::{Decoder, Encoder};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::frame::Pseudo;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("hpack decode error: {0:?}")]
    Decode(fluke_hpack::decoder::DecoderError),
    #[error("malformed pseudo-header {0}")]
    MalformedPseudo(&'static str),
    #[error("invalid header name")]
    InvalidName,
    #[error("invalid header value")]
    InvalidValue,
}

/// A connection-scoped HPACK table, used for one direction of traffic.
///
/// The encoder and decoder halves live in the same struct because in this
/// client both are driven from the same single-threaded event loop; nothing
/// is shared across tasks.
pub struct Table {
    encoder: Encoder<'static>,
    decoder: Decoder<'static>,
}

impl Table {
    pub fn new() -> Table {
        Table {
            encoder: Encoder::new(),
            decoder: Decoder::new(),
        }
    }

    /// Encodes a request header block: pseudo-headers first, per RFC 7540
    /// §8.1.2.1, followed by regular fields in their given order.
    pub fn encode_request(&mut self, pseudo: &Pseudo, fields: &HeaderMap) -> Bytes {
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(4 + fields.len());

        if let Some(method) = &pseudo.method {
            pairs.push((b":method".to_vec(), method.as_str().as_bytes().to_vec()));
        }
        if let Some(scheme) = &pseudo.scheme {
            pairs.push((b":scheme".to_vec(), scheme.as_bytes().to_vec()));
        }
        if let Some(authority) = &pseudo.authority {
            pairs.push((b":authority".to_vec(), authority.as_bytes().to_vec()));
        }
        if let Some(path) = &pseudo.path {
            pairs.push((b":path".to_vec(), path.as_bytes().to_vec()));
        }

        push_fields(&mut pairs, fields);

        Bytes::from(self.encoder.encode(pairs.iter().map(|(n, v)| (n.as_slice(), v.as_slice()))))
    }

    /// Encodes a response header block (`:status` plus regular fields). The
    /// client side of this crate never calls this -- a client doesn't send
    /// responses -- but it's the encoder-side counterpart `decode` needs a
    /// partner for, e.g. a test peer playing the server role.
    pub fn encode_response(&mut self, pseudo: &Pseudo, fields: &HeaderMap) -> Bytes {
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(1 + fields.len());

        if let Some(status) = &pseudo.status {
            pairs.push((b":status".to_vec(), status.as_str().as_bytes().to_vec()));
        }

        push_fields(&mut pairs, fields);

        Bytes::from(self.encoder.encode(pairs.iter().map(|(n, v)| (n.as_slice(), v.as_slice()))))
    }

    /// Encodes a trailer block: regular fields only, no pseudo-headers.
    pub fn encode_trailers(&mut self, fields: &HeaderMap) -> Bytes {
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(fields.len());
        push_fields(&mut pairs, fields);
        Bytes::from(self.encoder.encode(pairs.iter().map(|(n, v)| (n.as_slice(), v.as_slice()))))
    }

    /// Decodes a header block into pseudo-headers plus a regular `HeaderMap`.
    /// Works for requests, responses, push-promise blocks, and trailers: the
    /// caller distinguishes those cases by which pseudo-header fields ended
    /// up populated.
    pub fn decode(&mut self, block: &[u8]) -> Result<(Pseudo, HeaderMap), Error> {
        let decoded = self.decoder.decode(block).map_err(Error::Decode)?;

        let mut pseudo = Pseudo::default();
        let mut fields = HeaderMap::new();

        for (name, value) in decoded {
            if name.starts_with(b":") {
                match name.as_slice() {
                    b":method" => {
                        let s = std::str::from_utf8(&value).map_err(|_| Error::MalformedPseudo(":method"))?;
                        pseudo.method = Some(Method::from_bytes(s.as_bytes()).map_err(|_| Error::MalformedPseudo(":method"))?);
                    }
                    b":scheme" => {
                        pseudo.scheme = Some(String::from_utf8(value).map_err(|_| Error::MalformedPseudo(":scheme"))?);
                    }
                    b":authority" => {
                        pseudo.authority = Some(String::from_utf8(value).map_err(|_| Error::MalformedPseudo(":authority"))?);
                    }
                    b":path" => {
                        pseudo.path = Some(String::from_utf8(value).map_err(|_| Error::MalformedPseudo(":path"))?);
                    }
                    b":status" => {
                        let s = std::str::from_utf8(&value).map_err(|_| Error::MalformedPseudo(":status"))?;
                        pseudo.status = Some(StatusCode::from_bytes(s.as_bytes()).map_err(|_| Error::MalformedPseudo(":status"))?);
                    }
                    _ => return Err(Error::MalformedPseudo("unknown")),
                }
                continue;
            }

            let header_name = HeaderName::from_bytes(&name).map_err(|_| Error::InvalidName)?;
            let header_value = HeaderValue::from_bytes(&value).map_err(|_| Error::InvalidValue)?;
            fields.append(header_name, header_value);
        }

        Ok((pseudo, fields))
    }
}

fn push_fields(pairs: &mut Vec<(Vec<u8>, Vec<u8>)>, fields: &HeaderMap) {
    for (name, value) in fields.iter() {
        pairs.push((name.as_str().as_bytes().to_vec(), value.as_bytes().to_vec()));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use http::{HeaderName, HeaderValue, Method};
    use proptest::prelude::*;

    fn header_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,15}"
    }

    fn header_value() -> impl Strategy<Value = String> {
        "[ -~]{0,32}"
    }

    proptest! {
        /// Any request header block this crate encodes decodes back to the
        /// same pseudo-headers and field lines, in order, on an independent
        /// table -- HPACK's dynamic table only needs the two sides to agree
        /// on insertion history, not identity.
        #[test]
        fn request_round_trips(
            method in prop_oneof![Just(Method::GET), Just(Method::POST), Just(Method::PUT)],
            path in "/[a-z0-9/]{0,16}",
            names in prop::collection::vec(header_name(), 0..6),
            values in prop::collection::vec(header_value(), 0..6),
        ) {
            let mut enc = Table::new();
            let mut dec = Table::new();

            let pseudo = Pseudo::request(method.clone(), "https", "example.com", &path);
            let mut fields = HeaderMap::new();
            for (name, value) in names.iter().zip(values.iter()) {
                if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                    fields.append(name, value);
                }
            }

            let block = enc.encode_request(&pseudo, &fields);
            let (got_pseudo, got_fields) = dec.decode(&block).unwrap();

            prop_assert_eq!(got_pseudo.method, Some(method));
            prop_assert_eq!(got_pseudo.path.as_deref(), Some(path.as_str()));

            let want: Vec<(&HeaderName, &HeaderValue)> = fields.iter().collect();
            let got: Vec<(&HeaderName, &HeaderValue)> = got_fields.iter().collect();
            prop_assert_eq!(got, want);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn request_round_trips_through_independent_tables() {
        let mut enc = Table::new();
        let mut dec = Table::new();

        let pseudo = Pseudo::request(Method::GET, "https", "example.com", "/");
        let mut fields = HeaderMap::new();
        fields.insert("x-trace", HeaderValue::from_static("abc"));

        let block = enc.encode_request(&pseudo, &fields);
        let (got_pseudo, got_fields) = dec.decode(&block).unwrap();

        assert_eq!(got_pseudo.method, Some(Method::GET));
        assert_eq!(got_pseudo.path.as_deref(), Some("/"));
        assert_eq!(got_fields.get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn trailers_carry_no_pseudo_headers() {
        let mut enc = Table::new();
        let mut dec = Table::new();

        let mut fields = HeaderMap::new();
        fields.insert("x-checksum", HeaderValue::from_static("deadbeef"));

        let block = enc.encode_trailers(&fields);
        let (pseudo, got_fields) = dec.decode(&block).unwrap();

        assert!(pseudo.is_trailers());
        assert_eq!(got_fields.get("x-checksum").unwrap(), "deadbeef");
    }
}
