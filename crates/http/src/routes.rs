//! Route matching for the latency endpoint.

#![deny(missing_docs)]

use std::{borrow::Cow, sync::OnceLock, time::Duration};

use percent_encoding::percent_decode_str;
use regex::Regex;

/// Every path below this prefix is answered by the sleep handler.
pub const SLEEP_PREFIX: &str = "/sleep/";

/// The bare subtree root, redirected to [`SLEEP_PREFIX`].
const SLEEP_ROOT: &str = "/sleep";

// ASCII digits only: `\d` would also admit other Unicode decimal digits.
const SLEEP_PATTERN: &str = r"^/sleep/([0-9]+)$";

fn sleep_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SLEEP_PATTERN).expect("sleep pattern is a valid regex"))
}

/// The outcome of routing a path that the server knows how to answer.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch {
    /// Sleep, then respond with success.
    Sleep(SleepRequest),
    /// Permanently redirect to the given location.
    Redirect(&'static str),
}

/// A validated request to delay the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepRequest {
    millis: u64,
}

impl SleepRequest {
    /// Creates a request for a delay of `millis` milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// The requested delay in milliseconds.
    pub fn millis(&self) -> u64 {
        self.millis
    }

    /// The requested delay.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

/// Why a path did not produce a [`RouteMatch`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The path lies outside the sleep subtree.
    #[error("no route matches path {0}")]
    NotFound(String),
    /// The path lies in the sleep subtree but is not `/sleep/<digits>`.
    #[error("path {0} is not of the form /sleep/<milliseconds>")]
    Malformed(String),
    /// The digits do not fit a signed 64-bit integer.
    #[error("Cannot convert duration {0}")]
    InvalidDuration(String),
}

/// Routes a request path.
///
/// The path is percent-decoded before matching, so `/sleep/%31%30` asks for
/// ten milliseconds. Only `/sleep/` followed by one or more ASCII digits and
/// nothing else is a sleep request.
pub fn route(path: &str) -> Result<RouteMatch, RouteError> {
    let path = decode(path);

    if path == SLEEP_ROOT {
        return Ok(RouteMatch::Redirect(SLEEP_PREFIX));
    }
    if !path.starts_with(SLEEP_PREFIX) {
        return Err(RouteError::NotFound(path.into_owned()));
    }

    let digits = sleep_pattern()
        .captures(&path)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| RouteError::Malformed(path.to_string()))?
        .as_str();

    // Bounded by i64 like the durations clients send; the pattern rules out a sign.
    let millis = digits
        .parse::<i64>()
        .ok()
        .and_then(|millis| u64::try_from(millis).ok())
        .ok_or_else(|| RouteError::InvalidDuration(digits.to_owned()))?;

    Ok(RouteMatch::Sleep(SleepRequest::from_millis(millis)))
}

fn decode(path: &str) -> Cow<'_, str> {
    percent_decode_str(path)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(path))
}
