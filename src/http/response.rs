use std::collections::BTreeMap;
use std::time::SystemTime;

use bytes::Bytes;

use crate::files::Resolved;
use crate::http::request::Method;

/// Protocol token advertised on every response, whatever the client asked for.
pub const PROTOCOL: &str = "HTTP/1.0";

/// HTTP status codes the server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// A complete HTTP response ready to be serialized.
///
/// Headers are kept sorted by name; the order they go out on the wire is
/// decided by the writer, not by this map.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: BTreeMap<String, String>,
    /// Response body, `None` when there is nothing to send
    pub body: Option<Bytes>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body("hello")
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: BTreeMap<String, String>,
    body: Option<Bytes>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds the final Response.
    ///
    /// Adds `Date` unless one was given, and `Content-Length` when there is a
    /// body and no explicit length.
    pub fn build(mut self) -> Response {
        self.headers
            .entry("Date".to_string())
            .or_insert_with(|| httpdate::fmt_http_date(SystemTime::now()));

        if let Some(body) = &self.body {
            self.headers
                .entry("Content-Length".to_string())
                .or_insert_with(|| body.len().to_string());
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Builds the answer to `method` for a request target, given how it resolved.
    ///
    /// GET serves the outcome, HEAD serves it without a body, anything else
    /// is 501 and the outcome is ignored.
    pub fn for_method(method: &Method, target: &str, outcome: Resolved) -> Self {
        match method {
            Method::GET => Self::for_resource(target, outcome),
            Method::HEAD => {
                let mut response = Self::for_resource(target, outcome);
                response.remove_body();
                response
            }
            Method::Extension(_) => Self::not_implemented(),
        }
    }

    /// 200 with the file contents, or 404 naming the target.
    pub fn for_resource(target: &str, outcome: Resolved) -> Self {
        match outcome {
            Resolved::Found { body, content_type } => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", content_type.as_str())
                .body(body)
                .build(),
            Resolved::NotFound => Self::not_found(target),
        }
    }

    /// Creates a 404 Not Found response with an HTML body naming `target`.
    pub fn not_found(target: &str) -> Self {
        let page = format!(
            "<html><body>File {} not found.</body></html>",
            escape_html(target)
        );
        ResponseBuilder::new(StatusCode::NotFound)
            .header("Content-Type", "text/html")
            .body(page)
            .build()
    }

    /// Creates a 501 Not Implemented response. It has no body.
    pub fn not_implemented() -> Self {
        ResponseBuilder::new(StatusCode::NotImplemented).build()
    }

    /// Drops the body but leaves every header, Content-Length included.
    pub fn remove_body(&mut self) {
        self.body = None;
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
