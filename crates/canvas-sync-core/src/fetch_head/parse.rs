//! Parse HTTP response headers into HeadResult.

use reqwest::header::{HeaderMap, CONTENT_LENGTH};

use super::HeadResult;

/// Read `Content-Length` straight from the headers.
///
/// `Response::content_length` reports the body actually received, which is
/// always zero for HEAD.
pub fn parse_headers(headers: &HeaderMap) -> HeadResult {
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    HeadResult { content_length }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn parse_headers_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("12345"));
        let r = parse_headers(&headers);
        assert_eq!(r.content_length, Some(12345));
        assert_eq!(r.size(), 12345);
    }

    #[test]
    fn missing_or_garbage_length_is_zero() {
        assert_eq!(parse_headers(&HeaderMap::new()).size(), 0);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert_eq!(parse_headers(&headers).content_length, None);
    }
}
