use anyhow::Result;
use http::Response;
use sleeper_http::body::Body;

/// Create a span for an HTTP request.
macro_rules! http_span {
    ($request:tt, $addr:tt) => {
        tracing::info_span!(
            "sleeper_trigger_http.handle_http_request",
            "http.request.method" = %$request.method(),
            "network.peer.address" = %$addr.ip(),
            "network.peer.port" = %$addr.port(),
            "url.path" = $request.uri().path(),
            // Recorded later
            "error.type" = ::tracing::field::Empty,
            "http.response.status_code" = ::tracing::field::Empty,
        )
    };
}

pub(crate) use http_span;

/// Finish setting attributes on the HTTP span.
pub(crate) fn finalize_http_span(response: Result<Response<Body>>) -> Result<Response<Body>> {
    let span = tracing::Span::current();
    match response {
        Ok(response) => {
            tracing::debug!(
                "Request finished, sending response with status code {}",
                response.status()
            );
            span.record("http.response.status_code", response.status().as_u16());
            Ok(response)
        }
        Err(err) => {
            tracing::error!("Error processing request: {err:?}");
            span.record("error.type", format!("{:?}", err));
            span.record("http.response.status_code", 500);
            Err(err)
        }
    }
}
