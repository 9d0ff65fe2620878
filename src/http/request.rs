use std::collections::HashMap;
use std::fmt;

/// HTTP request methods.
///
/// Only GET and HEAD are served. Every other token is kept verbatim as an
/// extension method so it can be logged and answered with 501.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// Any other method token (POST, PUT, BREW, ...)
    Extension(String),
}

/// Represents a parsed HTTP request from a client.
///
/// A request produced by the parser always has a non-empty method and path,
/// and a version token starting with `HTTP/`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target exactly as sent (e.g., "/index.html")
    pub path: String,
    /// Protocol version token as sent (e.g., "HTTP/1.1")
    pub version: String,
    /// Request headers. Names are case-sensitive; a repeated name keeps the last value.
    pub headers: HashMap<String, String>,
    /// Body split into lines, without line terminators
    pub body: Vec<String>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    body: Vec<String>,
}

impl Method {
    /// Maps a method token onto a `Method`.
    ///
    /// Matching is case-sensitive: `get` is an extension method, not GET.
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Extension("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            other => Method::Extension(other.to_string()),
        }
    }

    /// The method token as it appeared on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::Extension(token) => token,
        }
    }

    /// Whether the server knows how to answer this method.
    pub fn is_supported(&self) -> bool {
        matches!(self, Method::GET | Method::HEAD)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body_line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let version = self.version.unwrap_or_else(|| "HTTP/1.0".to_string());
        if !version.starts_with("HTTP/") {
            return Err("version must start with HTTP/");
        }

        Ok(Request {
            method: self
                .method
                .filter(|m| !m.as_str().is_empty())
                .ok_or("method missing")?,
            path: self.path.filter(|p| !p.is_empty()).ok_or("path missing")?,
            version,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Parses the Content-Length header.
    ///
    /// Returns `None` if the header is missing or not a valid number.
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.trim().parse().ok())
    }
}

impl fmt::Display for Request {
    /// Renders the request roughly as it was received, headers sorted by name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.method, self.path, self.version)?;

        let mut names: Vec<&String> = self.headers.keys().collect();
        names.sort();
        for name in names {
            writeln!(f, "{}: {}", name, self.headers[name])?;
        }

        writeln!(f)?;
        for line in &self.body {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
