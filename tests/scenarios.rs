//! End-to-end scenarios driving a real client handshake against a fake peer
//! over an in-memory duplex pipe.

mod support;

use h2mux::frame::Reason;
use http::{Request, StatusCode};
use support::{pipe, FakePeer};
use tokio::task::LocalSet;

/// A GET with no body goes out as a single END_STREAM HEADERS frame
/// carrying the expected pseudo-headers; the response, once it arrives with
/// its own END_STREAM, yields an empty body.
#[tokio::test]
async fn simple_get() {
    let (client_io, server_io) = pipe();
    let local = LocalSet::new();

    local
        .run_until(async move {
            let (send_request, connector) = h2mux::handshake(client_io).await.unwrap();
            tokio::task::spawn_local(async { connector.run().await.unwrap() });

            let mut peer = FakePeer::new(server_io);
            let server = async move {
                peer.expect_preface().await;
                let headers = peer.read_headers().await;
                assert!(headers.is_end_stream());
                assert_eq!(headers.pseudo().method.as_ref().unwrap(), "GET");
                assert_eq!(headers.pseudo().scheme.as_deref(), Some("https"));
                assert_eq!(headers.pseudo().authority.as_deref(), Some("example.com"));
                assert_eq!(headers.pseudo().path.as_deref(), Some("/"));

                peer.send_response_headers(1, 200, true).await;
            };

            let request = Request::builder().uri("https://example.com/").body(()).unwrap();
            let (response, ()) = tokio::join!(send_request.send(request), server);
            let mut response = response.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.body_mut().data().await.is_none());
        })
        .await;
}

/// A response body arriving across two DATA frames is observed whole
/// and in order once END_STREAM lands on the second.
#[tokio::test]
async fn response_body_across_two_data_frames() {
    let (client_io, server_io) = pipe();
    let local = LocalSet::new();

    local
        .run_until(async move {
            let (send_request, connector) = h2mux::handshake(client_io).await.unwrap();
            tokio::task::spawn_local(async { connector.run().await.unwrap() });

            let mut peer = FakePeer::new(server_io);
            let server = async move {
                peer.expect_preface().await;
                peer.read_headers().await;
                peer.send_response_headers(1, 200, false).await;
                peer.send_data(1, b"hello ", false).await;
                peer.send_data(1, b"world", true).await;
            };

            let request = Request::builder().uri("https://example.com/").body(()).unwrap();
            let (response, ()) = tokio::join!(send_request.send(request), server);
            let mut response = response.unwrap();

            let mut body = Vec::new();
            while let Some(chunk) = response.body_mut().data().await {
                body.extend_from_slice(&chunk.unwrap());
            }
            assert_eq!(body, b"hello world");
        })
        .await;
}

/// An RST_STREAM mid-body surfaces as a terminal read error after the
/// bytes that arrived before it.
#[tokio::test]
async fn server_reset_mid_body_surfaces_as_read_error() {
    let (client_io, server_io) = pipe();
    let local = LocalSet::new();

    local
        .run_until(async move {
            let (send_request, connector) = h2mux::handshake(client_io).await.unwrap();
            tokio::task::spawn_local(async { connector.run().await.unwrap() });

            let mut peer = FakePeer::new(server_io);
            let server = async move {
                peer.expect_preface().await;
                peer.read_headers().await;
                peer.send_response_headers(1, 200, false).await;
                peer.send_data(1, b"partial", false).await;
                peer.send_reset(1, Reason::CANCEL).await;
            };

            let request = Request::builder().uri("https://example.com/").body(()).unwrap();
            let (response, ()) = tokio::join!(send_request.send(request), server);
            let mut response = response.unwrap();

            let first = response.body_mut().data().await.unwrap().unwrap();
            assert_eq!(&first[..], b"partial");

            match response.body_mut().data().await {
                Some(Err(_)) => {}
                other => panic!("expected a terminal read error after the reset, got {}", other.is_some()),
            }
        })
        .await;
}

/// Dropping the response future before it resolves cancels the request.
/// If the request never reached the wire, no RST_STREAM is sent.
#[tokio::test]
async fn dropping_unsent_response_future_sends_nothing() {
    let (client_io, server_io) = pipe();
    let local = LocalSet::new();

    local
        .run_until(async move {
            let (send_request, connector) = h2mux::handshake(client_io).await.unwrap();
            tokio::task::spawn_local(async { connector.run().await.unwrap() });

            let mut peer = FakePeer::new(server_io);
            peer.expect_preface().await;

            let request = Request::builder().uri("https://example.com/").body(()).unwrap();
            drop(send_request.send(request));

            let silence = tokio::time::timeout(std::time::Duration::from_millis(50), peer.read_frame()).await;
            assert!(silence.is_err(), "a canceled INIT stream must not reach the wire");
        })
        .await;
}

/// A PUSH_PROMISE is rejected by default with RST_STREAM(REFUSED_STREAM)
/// on the promised stream; the parent stream is unaffected.
#[tokio::test]
async fn push_promise_is_rejected_by_default() {
    let (client_io, server_io) = pipe();
    let local = LocalSet::new();

    local
        .run_until(async move {
            let (send_request, connector) = h2mux::handshake(client_io).await.unwrap();
            tokio::task::spawn_local(async { connector.run().await.unwrap() });

            let mut peer = FakePeer::new(server_io);
            let server = async move {
                peer.expect_preface().await;
                peer.read_headers().await;

                peer.send_push_promise(1, 2, "GET", "/logo.png").await;

                match peer.read_frame().await {
                    h2mux::frame::Frame::Reset(r) => {
                        assert_eq!(u32::from(r.stream_id()), 2);
                        assert_eq!(r.reason(), Reason::REFUSED_STREAM);
                    }
                    other => panic!("expected RST_STREAM, got {other:?}"),
                }

                peer.send_response_headers(1, 200, true).await;
            };

            let request = Request::builder().uri("https://example.com/").body(()).unwrap();
            let (response, ()) = tokio::join!(send_request.send(request), server);
            let mut response = response.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.body_mut().data().await.is_none());
        })
        .await;
}
