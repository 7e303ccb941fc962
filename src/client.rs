//! The application-facing client: `handshake` drives a connection,
//! `SendRequest` submits requests onto it, and `RecvStream` lets the caller
//! pull a response body at its own pace, independent of when frames
//! actually arrive off the wire.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{HeaderMap, Request, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

use crate::error::Error;
use crate::frame::Reason;
use crate::proto::streams::RequestHandle;
use crate::proto::{Config, Connection};

pub(crate) type ResponseResult = Result<Response<RecvStream>, Error>;

/// Type-erases the transport so `SendRequest`/`Connector` don't need to
/// carry `T` as a type parameter through the whole public API.
trait Driver {
    fn tick(&mut self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + '_>>;
    fn submit(&mut self, head: http::request::Parts, body: Option<Bytes>) -> (RequestHandle, oneshot::Receiver<ResponseResult>);
    fn cancel(&mut self, handle: RequestHandle, reason: Reason);
}

impl<T> Driver for Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    fn tick(&mut self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + '_>> {
        Box::pin(Connection::tick(self))
    }

    fn submit(&mut self, head: http::request::Parts, body: Option<Bytes>) -> (RequestHandle, oneshot::Receiver<ResponseResult>) {
        self.streams_mut().submit_request(head, body)
    }

    fn cancel(&mut self, handle: RequestHandle, reason: Reason) {
        self.streams_mut().cancel(handle, reason)
    }
}

/// A handle for submitting requests onto a connection. Cheaply cloned --
/// every clone submits onto the same underlying connection, matching how a
/// single HTTP/2 connection multiplexes many logical requests.
#[derive(Clone)]
pub struct SendRequest {
    driver: Rc<RefCell<Box<dyn Driver>>>,
}

/// Drives the connection's I/O loop. Must be polled to completion (e.g. via
/// `tokio::task::spawn_local`) for requests submitted through the paired
/// `SendRequest` to make progress.
pub struct Connector {
    driver: Rc<RefCell<Box<dyn Driver>>>,
}

/// Performs the client-side handshake (writes the connection preface) and
/// returns a request handle plus the connection driver.
pub async fn handshake<T>(io: T) -> Result<(SendRequest, Connector), Error>
where
    T: AsyncRead + AsyncWrite + Unpin + 'static,
{
    handshake_with_config(io, Config::default()).await
}

pub async fn handshake_with_config<T>(io: T, config: Config) -> Result<(SendRequest, Connector), Error>
where
    T: AsyncRead + AsyncWrite + Unpin + 'static,
{
    let mut conn = Connection::new(io, config);
    conn.write_preface().await?;

    let driver: Rc<RefCell<Box<dyn Driver>>> = Rc::new(RefCell::new(Box::new(conn)));

    Ok((
        SendRequest {
            driver: driver.clone(),
        },
        Connector { driver },
    ))
}

impl Connector {
    pub async fn run(self) -> Result<(), Error> {
        loop {
            // The borrow must not outlive the await point below, so the
            // boxed future is built and dropped within one statement.
            let result = {
                let mut driver = self.driver.borrow_mut();
                driver.tick()
            }
            .await;
            result?;
        }
    }
}

impl SendRequest {
    /// Submits a request with no body. `:scheme`/`:authority` are derived
    /// from the request's URI; the path defaults to `/` if none is given.
    /// The request is queued onto the connection immediately; the returned
    /// future resolves once the response HEADERS arrive.
    pub fn send(&self, request: Request<()>) -> ResponseFuture {
        self.send_with_body(request, None)
    }

    pub fn send_with_body(&self, request: Request<()>, body: Option<Bytes>) -> ResponseFuture {
        let (head, ()) = request.into_parts();
        let (handle, rx) = self.driver.borrow_mut().submit(head, body);
        ResponseFuture {
            driver: self.driver.clone(),
            handle: Some(handle),
            rx,
        }
    }
}

/// Resolves to the response once its HEADERS arrive. Dropping this future
/// before that happens cancels the request -- the stream is reset at most
/// once, whether that happens through a drop, an explicit
/// [`ResponseFuture::cancel`], or the response simply arriving first (in
/// which case drop is a no-op).
pub struct ResponseFuture {
    driver: Rc<RefCell<Box<dyn Driver>>>,
    handle: Option<RequestHandle>,
    rx: oneshot::Receiver<ResponseResult>,
}

impl ResponseFuture {
    /// Cancels the request, resetting its stream with `CANCEL` if it was
    /// ever assigned a wire id. A no-op if the response already arrived.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            self.driver.borrow_mut().cancel(handle, Reason::CANCEL);
        }
    }
}

impl Future for ResponseFuture {
    type Output = Result<Response<RecvStream>, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => {
                this.handle = None;
                Poll::Ready(result)
            }
            Poll::Ready(Err(_)) => {
                this.handle = None;
                Poll::Ready(Err(Error::ConnectionClosed))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ResponseFuture {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.driver.borrow_mut().cancel(handle, Reason::CANCEL);
        }
    }
}

/// A response body the application drains independently of the connection's
/// read loop. Not `Clone`: the response pipeline has exactly one consumer.
pub struct RecvStream {
    pipeline: Rc<RefCell<crate::proto::streams::Pipeline>>,
}

impl RecvStream {
    pub(crate) fn new(pipeline: Rc<RefCell<crate::proto::streams::Pipeline>>) -> RecvStream {
        RecvStream { pipeline }
    }

    /// Pulls the next chunk of body bytes, or `None` at EOF.
    pub async fn data(&mut self) -> Option<Result<Bytes, Error>> {
        std::future::poll_fn(|cx| self.poll_data(cx)).await
    }

    fn poll_data(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Bytes, Error>>> {
        let mut pipeline = self.pipeline.borrow_mut();

        if let Some(chunk) = pipeline.pop_data() {
            return Poll::Ready(Some(Ok(chunk)));
        }

        if let Some(err) = pipeline.take_error() {
            return Poll::Ready(Some(Err(err)));
        }

        if pipeline.is_eof() {
            return Poll::Ready(None);
        }

        pipeline.register_waker(cx.waker());
        Poll::Pending
    }

    /// Trailers, if the response carried any. Only meaningful once `data()`
    /// has returned `None`.
    pub fn trailers(&mut self) -> Option<HeaderMap> {
        self.pipeline.borrow_mut().take_trailers()
    }
}
