//! Push-promise policy. The header block of a PUSH_PROMISE is decoded into
//! a synthetic request (the promised headers); `decide` is the single
//! extension point a future acceptance policy would replace.

use crate::frame::Pseudo;

/// What to do with a promised request once its header block has fully
/// decoded. `Reject` is the only policy implemented: nothing downstream of
/// this module consumes a pushed response yet, so accepting one would leave
/// it permanently undrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Reject,
}

/// The promised request carried by a PUSH_PROMISE block, recorded for the
/// benefit of a future matching policy. Unused by `decide` today but part
/// of the extension point's shape.
#[derive(Debug)]
pub struct PromisedRequest {
    pub pseudo: Pseudo,
}

pub fn decide(_promised: &PromisedRequest) -> Decision {
    Decision::Reject
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn default_policy_always_rejects() {
        let promised = PromisedRequest {
            pseudo: Pseudo::request(Method::GET, "https", "example.com", "/logo.png"),
        };
        assert_eq!(decide(&promised), Decision::Reject);
    }
}
