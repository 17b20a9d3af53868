use sha2::{Digest, Sha256};

use crate::key::hex_encode;

/// Case-insensitive header mapping that remembers the caller's spelling.
///
/// Inserting a name that is already present (in any case) replaces its value
/// in place, so the mapping never holds two entries for one header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Create an empty header mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .0
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Look a header up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether a header is present, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no headers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate headers in insertion order with their original spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Lower-cased `(name, trimmed value)` pairs sorted by name.
    fn canonical_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .0
            .iter()
            .map(|(name, value)| (name.to_lowercase(), value.trim().to_string()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Abstract description of an HTTP request to be signed.
///
/// The path and query string are taken as already percent-encoded and are
/// used verbatim in the canonical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: String,
    path: String,
    query: String,
    headers: Headers,
    body: Vec<u8>,
}

impl RequestDescriptor {
    /// Create a request with the given method and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Create a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Create a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Set the (pre-encoded) query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the URI path, defaulting to `/` when empty.
    pub fn path(&self) -> &str {
        if self.path.is_empty() { "/" } else { &self.path }
    }

    /// Get the query string.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Get the headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}

/// The canonical form of a request, as hashed into the string-to-sign.
///
/// ```text
/// METHOD
/// /uri/path
/// query
/// name:value        (one line per header, sorted, newline terminated)
///
/// signed;header;names
/// hex(sha256(body))
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    canonical: String,
    signed_headers: String,
}

impl CanonicalRequest {
    /// Render the canonical form of a request.
    pub fn new(request: &RequestDescriptor) -> Self {
        let pairs = request.headers().canonical_pairs();

        let canonical_headers = pairs
            .iter()
            .map(|(name, value)| format!("{}:{}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";

        let signed_headers = pairs
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let body_hash = hex_encode(&Sha256::digest(request.body()));

        let canonical = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method(),
            request.path(),
            request.query(),
            canonical_headers,
            signed_headers,
            body_hash
        );

        Self {
            canonical,
            signed_headers,
        }
    }

    /// The canonical request string.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Semicolon-joined, sorted, lower-cased header names.
    pub fn signed_headers(&self) -> &str {
        &self.signed_headers
    }

    /// Lowercase hex SHA-256 of the canonical request.
    pub fn hash(&self) -> String {
        hex_encode(&Sha256::digest(self.canonical.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn it_renders_the_canonical_form() {
        let request = RequestDescriptor::get("/")
            .with_header("Host", "example.amazonaws.com")
            .with_header("X-Amz-Date", "20150830T123600Z");

        let canonical = CanonicalRequest::new(&request);

        assert_eq!(
            canonical.as_str(),
            format!(
                "GET\n/\n\nhost:example.amazonaws.com\nx-amz-date:20150830T123600Z\n\nhost;x-amz-date\n{}",
                EMPTY_SHA256
            )
        );
        assert_eq!(canonical.signed_headers(), "host;x-amz-date");
    }

    #[test]
    fn it_is_independent_of_header_insertion_order() {
        let forward = RequestDescriptor::post("/a")
            .with_header("Host", "h")
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json");
        let backward = RequestDescriptor::post("/a")
            .with_header("accept", "application/json")
            .with_header("CONTENT-TYPE", "application/json")
            .with_header("host", "h");

        let forward = CanonicalRequest::new(&forward);
        let backward = CanonicalRequest::new(&backward);

        assert_eq!(forward, backward);
        assert_eq!(forward.signed_headers(), "accept;content-type;host");
    }

    #[test]
    fn it_trims_header_values() {
        let request = RequestDescriptor::get("/").with_header("Host", "  example.com \t");
        let canonical = CanonicalRequest::new(&request);

        assert!(canonical.as_str().contains("\nhost:example.com\n"));
    }

    #[test]
    fn it_accepts_an_empty_header_map() {
        let request = RequestDescriptor::get("/");
        let canonical = CanonicalRequest::new(&request);

        assert_eq!(canonical.signed_headers(), "");
        assert_eq!(canonical.as_str(), format!("GET\n/\n\n\n\n\n{}", EMPTY_SHA256));
    }

    #[test]
    fn it_keeps_path_and_query_verbatim() {
        let request = RequestDescriptor::get("/a%20b/c")
            .with_query("x=1&y=%2F")
            .with_header("Host", "h");
        let canonical = CanonicalRequest::new(&request);

        assert!(canonical.as_str().starts_with("GET\n/a%20b/c\nx=1&y=%2F\n"));
    }

    #[test]
    fn it_hashes_the_body() {
        let request = RequestDescriptor::post("/")
            .with_header("Host", "h")
            .with_body("hello");
        let canonical = CanonicalRequest::new(&request);

        assert!(
            canonical
                .as_str()
                .ends_with("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
    }

    #[test]
    fn it_replaces_headers_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("content-type", "application/json");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
    }
}
