//! HTTP message types
//!
//! This module defines the request sent by the client and the response it
//! reads back.

use super::{Error, Headers, Result, CRLF};
use std::fmt;

/// Request method; this client only issues GET
pub const METHOD_GET: &str = "GET";

/// HTTP version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// Parse a version token as it appears on the wire
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            _ => Err(Error::InvalidVersion(s.to_string())),
        }
    }

    /// Select the request version from the optional command-line argument
    ///
    /// Only the exact literal `1.0` selects HTTP/1.0; anything else, including
    /// no argument at all, selects HTTP/1.1.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("1.0") => Version::Http10,
            _ => Version::Http11,
        }
    }

    /// Convert version to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status {
    code: u16,
}

impl Status {
    pub const OK: Status = Status { code: 200 };
    pub const NO_CONTENT: Status = Status { code: 204 };
    pub const NOT_MODIFIED: Status = Status { code: 304 };

    /// Create a status code, rejecting values outside 100..=599
    pub fn new(code: u16) -> Result<Self> {
        if (100..600).contains(&code) {
            Ok(Status { code })
        } else {
            Err(Error::InvalidStatus(format!("Invalid status code: {}", code)))
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// Canonical reason phrase, used when the peer omits one
    pub fn reason_phrase(&self) -> &'static str {
        match self.code {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            410 => "Gone",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            _ => "Unknown",
        }
    }

    /// 1xx
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Whether a response with this status never carries a body
    pub fn forbids_body(&self) -> bool {
        self.is_informational() || *self == Status::NO_CONTENT || *self == Status::NOT_MODIFIED
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason_phrase())
    }
}

/// HTTP GET request without a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    target: String,
    version: Version,
    headers: Headers,
}

impl Request {
    /// Start building a GET request for `target`
    pub fn get(target: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            target: target.into(),
            version: Version::default(),
            fields: Vec::new(),
        }
    }

    pub fn method(&self) -> &'static str {
        METHOD_GET
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Encode the request line, header fields and terminating blank line
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);

        buf.extend_from_slice(METHOD_GET.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.target.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.version.as_str().as_bytes());
        buf.extend_from_slice(CRLF.as_bytes());

        self.headers.write_wire(&mut buf);
        buf.extend_from_slice(CRLF.as_bytes());

        buf
    }
}

/// Builder for GET requests
#[derive(Debug)]
pub struct RequestBuilder {
    target: String,
    version: Version,
    fields: Vec<(String, String)>,
}

impl RequestBuilder {
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Add a header field
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Build the request
    ///
    /// The target must be non-empty and free of whitespace and control
    /// characters; header values must not contain CR or LF.
    pub fn build(self) -> Result<Request> {
        if self.target.is_empty()
            || self
                .target
                .bytes()
                .any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
        {
            return Err(Error::Parse(format!("Invalid request target: {:?}", self.target)));
        }

        let mut headers = Headers::new();
        for (name, value) in self.fields {
            if value.contains(['\r', '\n']) {
                return Err(Error::InvalidHeader(format!("Line break in value of {}", name)));
            }
            headers.insert(name, value)?;
        }

        Ok(Request {
            target: self.target,
            version: self.version,
            headers,
        })
    }
}

/// HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: Version,
    status: Status,
    reason: String,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Prints the status line, the header fields, a blank line and the body
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}{}", self.version, self.status.code(), self.reason, CRLF)?;
        write!(f, "{}{}", self.headers, CRLF)?;
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}

/// Builder for HTTP responses
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    version: Option<Version>,
    status: Option<Status>,
    reason: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Build the response; the reason defaults to the canonical phrase
    pub fn build(self) -> Response {
        let status = self.status.unwrap_or(Status::OK);
        let reason = self
            .reason
            .unwrap_or_else(|| status.reason_phrase().to_string());

        Response {
            version: self.version.unwrap_or_default(),
            status,
            reason,
            headers: self.headers,
            body: self.body,
        }
    }
}
