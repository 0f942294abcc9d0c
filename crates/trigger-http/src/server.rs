use std::{io, net::SocketAddr};

use anyhow::Context;
use http::{header, Request, Response, StatusCode};
use hyper::{
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use sleeper_http::{
    body::{self, Body},
    routes::{self, RouteError, RouteMatch, SleepRequest},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
    task,
};
use tracing::Instrument;

use crate::instrument::{finalize_http_span, http_span};

/// Serves the latency endpoint on an already bound listener.
///
/// The server holds no per-request state: every connection gets its own task
/// and every request on it is routed, slept and answered independently.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpServer;

impl HttpServer {
    pub fn new() -> Self {
        Self
    }

    /// Accepts connections until the listener fails.
    ///
    /// Errors that only concern the connection being accepted are logged and
    /// skipped; any other accept error ends the loop and is returned.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        self.print_startup_msgs(&listener)?;
        loop {
            let (stream, client_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) if is_connection_error(&err) => {
                    tracing::warn!("Error accepting connection: {err:?}");
                    continue;
                }
                Err(err) => {
                    tracing::warn!("Error accepting connections, shutting down: {err:?}");
                    return Err(err).context("failed to accept connection");
                }
            };
            self.serve_connection(stream, client_addr);
        }
    }

    /// Routes a request and produces its response.
    ///
    /// Sleep requests are delayed for the full interval before answering;
    /// nothing here observes the client going away.
    pub async fn handle<B>(
        &self,
        req: Request<B>,
        client_addr: SocketAddr,
    ) -> anyhow::Result<Response<Body>> {
        match routes::route(req.uri().path()) {
            Ok(RouteMatch::Sleep(sleep)) => Self::sleep(sleep, client_addr).await,
            Ok(RouteMatch::Redirect(location)) => Self::moved_permanently(location),
            Err(RouteError::NotFound(_)) => Self::not_found(),
            Err(RouteError::Malformed(_)) => Self::bad_request(None),
            Err(err @ RouteError::InvalidDuration(_)) => {
                Self::bad_request(Some(&err.to_string()))
            }
        }
    }

    async fn sleep(
        sleep: SleepRequest,
        client_addr: SocketAddr,
    ) -> anyhow::Result<Response<Body>> {
        let sleep_time = sleep.duration();
        tracing::info!("Sleep for {sleep_time:?} for {client_addr}");
        tokio::time::sleep(sleep_time).await;
        Ok(Response::builder()
            .status(StatusCode::OK)
            .body(body::empty())?)
    }

    /// Creates an HTTP 400 response, with an optional plain-text explanation.
    fn bad_request(body: Option<&str>) -> anyhow::Result<Response<Body>> {
        let builder = Response::builder().status(StatusCode::BAD_REQUEST);
        let response = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(body::full(Bytes::copy_from_slice(body.as_bytes())))?,
            None => builder.body(body::empty())?,
        };
        Ok(response)
    }

    /// Creates an HTTP 301 response.
    fn moved_permanently(location: &str) -> anyhow::Result<Response<Body>> {
        Ok(Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header(header::LOCATION, location)
            .body(body::empty())?)
    }

    /// Creates an HTTP 404 response.
    fn not_found() -> anyhow::Result<Response<Body>> {
        Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(body::empty())?)
    }

    fn serve_connection<S: AsyncRead + AsyncWrite + Unpin + Send + 'static>(
        self,
        stream: S,
        client_addr: SocketAddr,
    ) {
        task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .keep_alive(true)
                .serve_connection(
                    TokioIo::new(stream),
                    service_fn(move |request| {
                        self.instrumented_service_fn(client_addr, request)
                    }),
                )
                .await
            {
                tracing::warn!("Error serving HTTP connection: {err:?}");
            }
        });
    }

    async fn instrumented_service_fn(
        self,
        client_addr: SocketAddr,
        request: Request<Incoming>,
    ) -> anyhow::Result<Response<Body>> {
        let span = http_span!(request, client_addr);
        async {
            let result = self.handle(request, client_addr).await;
            finalize_http_span(result)
        }
        .instrument(span)
        .await
    }

    fn print_startup_msgs(&self, listener: &TcpListener) -> anyhow::Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Testserver listening on {local_addr}");
        Ok(())
    }
}

/// Accept errors that concern a single incoming connection rather than the
/// listener itself.
fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http_body_util::BodyExt;
    use tokio::time::Instant;

    use super::*;

    fn client_addr() -> SocketAddr {
        "127.0.0.1:8777".parse().unwrap()
    }

    async fn get(path: &str) -> Response<Body> {
        let req = Request::get(path).body(()).unwrap();
        HttpServer::new().handle(req, client_addr()).await.unwrap()
    }

    async fn body_text(res: Response<Body>) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_for_requested_duration_then_succeeds() {
        let start = Instant::now();
        let res = get("/sleep/1500").await;
        assert_eq!(res.status(), StatusCode::OK);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1510), "{elapsed:?}");
        assert_eq!(body_text(res).await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_does_not_sleep() {
        let start = Instant::now();
        let res = get("/sleep/0").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(start.elapsed() < Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn any_method_is_accepted() {
        let req = Request::post("/sleep/20").body(()).unwrap();
        let res = HttpServer::new().handle(req, client_addr()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_paths_are_rejected_without_sleeping() {
        for path in ["/sleep/", "/sleep/abc", "/sleep/12/extra", "/sleep/12/"] {
            let start = Instant::now();
            let res = get(path).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(start.elapsed(), Duration::ZERO, "{path}");
            assert_eq!(body_text(res).await, "", "{path}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overflowing_duration_returns_diagnostic_without_sleeping() {
        let start = Instant::now();
        let res = get("/sleep/99999999999999999999").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_text(res).await,
            "Cannot convert duration 99999999999999999999"
        );
    }

    #[tokio::test]
    async fn bare_sleep_path_redirects_into_subtree() {
        let res = get("/sleep").await;
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/sleep/");
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        for path in ["/", "/nonexistent", "/sleeep/1"] {
            let res = get(path).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[test]
    fn connection_errors_do_not_stop_the_accept_loop() {
        assert!(is_connection_error(&io::Error::from(
            io::ErrorKind::ConnectionAborted
        )));
        assert!(!is_connection_error(&io::Error::from(
            io::ErrorKind::PermissionDenied
        )));
    }
}
