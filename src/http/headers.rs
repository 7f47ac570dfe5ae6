//! HTTP header fields
//!
//! Header fields keep their wire order and are looked up case-insensitively.
//! A name may appear more than once.

use super::{Error, Result, CRLF, MAX_HEADERS};
use std::fmt;

/// HTTP header field collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty collection
    pub fn new() -> Self {
        Headers { fields: Vec::new() }
    }

    /// Append a field, keeping any earlier fields of the same name
    ///
    /// Fails once the collection holds `MAX_HEADERS` fields.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        if self.fields.len() >= MAX_HEADERS {
            return Err(Error::HeaderLimit);
        }

        self.fields.push((name.into(), value.into()));
        Ok(())
    }

    /// Get the first value for a field (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get all values for a field (case-insensitive)
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Split a header line into name and value
    ///
    /// Whitespace between the name and the colon is rejected (RFC 7230 3.2.4);
    /// optional whitespace around the value is trimmed.
    pub fn parse_header_line(line: &str) -> Result<(String, String)> {
        let colon_pos = line
            .find(':')
            .ok_or_else(|| Error::InvalidHeader(format!("No colon in header: {}", line)))?;

        let name = &line[..colon_pos];
        if name.is_empty() {
            return Err(Error::InvalidHeader("Empty header name".to_string()));
        }
        if name.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
            return Err(Error::InvalidHeader(format!("Malformed header name: {:?}", name)));
        }

        let value = line[colon_pos + 1..].trim_matches(|c| c == ' ' || c == '\t');
        Ok((name.to_string(), value.to_string()))
    }

    /// Append this collection in wire format (`Name: value\r\n` per field)
    pub(crate) fn write_wire(&self, buf: &mut Vec<u8>) {
        for (name, value) in &self.fields {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(CRLF.as_bytes());
        }
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            write!(f, "{}: {}{}", name, value, CRLF)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/html").unwrap();
        headers.insert("Content-Length", "42").unwrap();

        assert_eq!(headers.get("Content-Type"), Some("text/html"));
        assert_eq!(headers.get("content-length"), Some("42"));
        assert_eq!(headers.get("Missing"), None);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn test_repeated_fields_keep_order() {
        let mut headers = Headers::new();
        headers.insert("Set-Cookie", "a=1").unwrap();
        headers.insert("Server", "test").unwrap();
        headers.insert("set-cookie", "b=2").unwrap();

        assert_eq!(headers.get("Set-Cookie"), Some("a=1"));
        assert_eq!(headers.get_all("Set-Cookie"), vec!["a=1", "b=2"]);

        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Set-Cookie", "Server", "set-cookie"]);
    }

    #[test]
    fn test_parse_header_line() {
        let (name, value) = Headers::parse_header_line("Content-Type: text/html").unwrap();
        assert_eq!(name, "Content-Type");
        assert_eq!(value, "text/html");

        let (name, value) = Headers::parse_header_line("X-Custom:\t value  ").unwrap();
        assert_eq!(name, "X-Custom");
        assert_eq!(value, "value");

        let (_, value) = Headers::parse_header_line("X-Empty:").unwrap();
        assert_eq!(value, "");

        assert!(Headers::parse_header_line("Invalid").is_err());
        assert!(Headers::parse_header_line(": value").is_err());
        assert!(Headers::parse_header_line("Bad Name : value").is_err());
    }

    #[test]
    fn test_field_limit() {
        let mut headers = Headers::new();
        for i in 0..MAX_HEADERS {
            headers.insert(format!("Header-{}", i), "value").unwrap();
        }

        assert!(matches!(headers.insert("One-Too-Many", "x"), Err(Error::HeaderLimit)));
        assert_eq!(headers.len(), MAX_HEADERS);
    }

    #[test]
    fn test_wire_and_display() {
        let mut headers = Headers::new();
        headers.insert("Host", "example.com").unwrap();
        headers.insert("User-Agent", "test/1.0").unwrap();

        let mut wire = Vec::new();
        headers.write_wire(&mut wire);
        assert_eq!(wire, b"Host: example.com\r\nUser-Agent: test/1.0\r\n");
        assert_eq!(headers.to_string().as_bytes(), wire.as_slice());
    }
}
