//! Recursive-descent parser for the HTTP/1.1 message grammar (RFC 9112).
//!
//! [`parse_message`] is the entry point for the server role: it reads the
//! request-line and header section and stops right after the blank line, so
//! the cursor is positioned at the first body byte. Reading the body is left
//! to the dispatcher, which knows whether one was declared.
//!
//! Every rule is a small async function over a [`ByteCursor`], peeking one
//! byte to decide and consuming only what belongs to the rule.

use tokio::io::AsyncRead;

use super::error::{ParseError, ParseResult, TargetForm};
use super::{ByteCursor, HeaderField, Headers, Request, RequestLine, StatusCode, StatusLine, Version};

/// Maximum number of header fields accepted per request.
pub const MAX_HEADERS: usize = 64;

/// Maximum length of any single token, path segment, query or field value.
pub const MAX_ELEMENT_LEN: usize = 8 * 1024;

/// Parses a request-line and header section. The body is not read.
///
/// Header names keep their received casing; repeated names accumulate their
/// values in order.
///
/// # Errors
///
/// Any grammar violation, [`ParseError::UnsupportedTarget`] for non-origin
/// targets, or [`ParseError::EndOfStream`] if the peer stops early.
pub async fn parse_message<R>(cursor: &mut ByteCursor<R>) -> ParseResult<Request>
where
    R: AsyncRead + Unpin,
{
    let line = parse_request_line(cursor).await?;

    let mut headers = Headers::new();
    let mut count = 0;
    while cursor.peek().await? != b'\r' {
        if count == MAX_HEADERS {
            return Err(ParseError::TooManyHeaders { limit: MAX_HEADERS });
        }
        let field = parse_header_field(cursor).await?;
        headers.insert(field.name, field.value);
        count += 1;
        cursor.expect(b"\r\n").await?;
    }
    cursor.expect(b"\r\n").await?;

    Ok(Request::new(line, headers))
}

/// `request-line = method SP request-target SP HTTP-version CRLF`
pub async fn parse_request_line<R>(cursor: &mut ByteCursor<R>) -> ParseResult<RequestLine>
where
    R: AsyncRead + Unpin,
{
    let method = parse_token(cursor, "method token").await?;
    cursor.expect(b" ").await?;
    let (target, query) = parse_request_target(cursor).await?;
    cursor.expect(b" ").await?;
    let version = parse_http_version(cursor).await?;
    cursor.expect(b"\r\n").await?;

    Ok(RequestLine {
        method,
        target,
        query,
        version,
    })
}

/// Dispatches on the first byte of the request-target. Only origin-form is served.
pub async fn parse_request_target<R>(
    cursor: &mut ByteCursor<R>,
) -> ParseResult<(Vec<String>, Option<String>)>
where
    R: AsyncRead + Unpin,
{
    match cursor.peek().await? {
        b'/' => parse_origin_form(cursor).await,
        b if b.is_ascii_alphabetic() => {
            Err(ParseError::UnsupportedTarget(TargetForm::AbsoluteOrAuthority))
        }
        b'*' => Err(ParseError::UnsupportedTarget(TargetForm::Asterisk)),
        found => Err(ParseError::Unexpected {
            found,
            expected: "request-target",
        }),
    }
}

/// `origin-form = 1*( "/" segment ) [ "?" query ]`
pub async fn parse_origin_form<R>(
    cursor: &mut ByteCursor<R>,
) -> ParseResult<(Vec<String>, Option<String>)>
where
    R: AsyncRead + Unpin,
{
    let mut segments = Vec::with_capacity(1);
    while cursor.peek().await? == b'/' {
        segments.push(parse_segment(cursor).await?);
    }

    let query = if cursor.peek().await? == b'?' {
        cursor.next().await?;
        Some(parse_query(cursor).await?)
    } else {
        None
    };

    Ok((segments, query))
}

/// Consumes `/` and one segment, decoding `%XX` escapes.
///
/// A decoded `%2F` stays inside the segment; only a literal `/` ends it.
pub async fn parse_segment<R>(cursor: &mut ByteCursor<R>) -> ParseResult<String>
where
    R: AsyncRead + Unpin,
{
    cursor.expect(b"/").await?;

    let mut segment = Vec::new();
    loop {
        let byte = match cursor.peek().await? {
            b'%' => {
                cursor.next().await?;
                let high = parse_hex_digit(cursor).await?;
                let low = parse_hex_digit(cursor).await?;
                (high << 4) | low
            }
            b if is_pchar(b) => cursor.next().await?,
            _ => break,
        };
        push_limited(&mut segment, byte, "path segment")?;
    }

    String::from_utf8(segment).map_err(|_| ParseError::InvalidUtf8)
}

// query = *( pchar / "/" / "?" ), kept raw.
async fn parse_query<R>(cursor: &mut ByteCursor<R>) -> ParseResult<String>
where
    R: AsyncRead + Unpin,
{
    let mut query = Vec::new();
    loop {
        match cursor.peek().await? {
            b if is_pchar(b) || matches!(b, b'/' | b'?' | b'%') => {
                push_limited(&mut query, b, "query")?;
                cursor.next().await?;
            }
            _ => break,
        }
    }
    String::from_utf8(query).map_err(|_| ParseError::InvalidUtf8)
}

/// `HTTP-version = "HTTP/" DIGIT "." DIGIT`, packed as `major << 4 | minor`.
pub async fn parse_http_version<R>(cursor: &mut ByteCursor<R>) -> ParseResult<Version>
where
    R: AsyncRead + Unpin,
{
    cursor.expect(b"HTTP/").await?;
    let major = parse_digit(cursor).await?;
    cursor.expect(b".").await?;
    let minor = parse_digit(cursor).await?;
    Ok(Version::new(major, minor))
}

/// `token = 1*tchar`. Used for methods and field names.
pub async fn parse_token<R>(cursor: &mut ByteCursor<R>, what: &'static str) -> ParseResult<String>
where
    R: AsyncRead + Unpin,
{
    let mut token = String::new();
    loop {
        let b = cursor.peek().await?;
        if !is_tchar(b) {
            if token.is_empty() {
                return Err(ParseError::Unexpected { found: b, expected: what });
            }
            return Ok(token);
        }
        if token.len() == MAX_ELEMENT_LEN {
            return Err(ParseError::TooLong {
                what,
                limit: MAX_ELEMENT_LEN,
            });
        }
        cursor.next().await?;
        token.push(char::from(b));
    }
}

/// `field-name ":" OWS field-value OWS`. The caller consumes the CRLF.
pub async fn parse_header_field<R>(cursor: &mut ByteCursor<R>) -> ParseResult<HeaderField>
where
    R: AsyncRead + Unpin,
{
    let name = parse_token(cursor, "field name").await?;
    cursor.expect(b":").await?;
    skip_optional_whitespace(cursor).await?;
    let value = parse_field_value(cursor).await?;
    skip_optional_whitespace(cursor).await?;
    Ok(HeaderField { name, value })
}

// Field content with trailing whitespace trimmed; obs-text is decoded lossily.
async fn parse_field_value<R>(cursor: &mut ByteCursor<R>) -> ParseResult<String>
where
    R: AsyncRead + Unpin,
{
    let mut value = Vec::new();
    let mut content_len = 0;
    loop {
        match cursor.peek().await? {
            b if is_field_vchar(b) => {
                push_limited(&mut value, b, "field value")?;
                content_len = value.len();
            }
            b @ (b' ' | b'\t') => push_limited(&mut value, b, "field value")?,
            _ => break,
        }
        cursor.next().await?;
    }
    value.truncate(content_len);
    Ok(String::from_utf8_lossy(&value).into_owned())
}

async fn skip_optional_whitespace<R>(cursor: &mut ByteCursor<R>) -> ParseResult<()>
where
    R: AsyncRead + Unpin,
{
    while matches!(cursor.peek().await?, b' ' | b'\t') {
        cursor.next().await?;
    }
    Ok(())
}

/// `status-line = HTTP-version SP status-code SP [ reason-phrase ] CRLF`
///
/// The reason phrase is skipped. Only a client role needs this rule.
pub async fn parse_status_line<R>(cursor: &mut ByteCursor<R>) -> ParseResult<StatusLine>
where
    R: AsyncRead + Unpin,
{
    let version = parse_http_version(cursor).await?;
    cursor.expect(b" ").await?;

    let mut code = 0u16;
    for _ in 0..3 {
        code = code * 10 + u16::from(parse_digit(cursor).await?);
    }

    if cursor.peek().await? != b'\r' {
        cursor.expect(b" ").await?;
        let mut reason_len = 0;
        while cursor.next().await? != b'\r' {
            if reason_len == MAX_ELEMENT_LEN {
                return Err(ParseError::TooLong {
                    what: "reason phrase",
                    limit: MAX_ELEMENT_LEN,
                });
            }
            reason_len += 1;
        }
        cursor.expect(b"\n").await?;
    } else {
        cursor.expect(b"\r\n").await?;
    }

    Ok(StatusLine {
        version,
        status: StatusCode::from_u16(code),
    })
}

async fn parse_digit<R>(cursor: &mut ByteCursor<R>) -> ParseResult<u8>
where
    R: AsyncRead + Unpin,
{
    match cursor.next().await? {
        b @ b'0'..=b'9' => Ok(b - b'0'),
        found => Err(ParseError::Unexpected {
            found,
            expected: "decimal digit",
        }),
    }
}

async fn parse_hex_digit<R>(cursor: &mut ByteCursor<R>) -> ParseResult<u8>
where
    R: AsyncRead + Unpin,
{
    match cursor.next().await? {
        b @ b'0'..=b'9' => Ok(b - b'0'),
        b @ b'a'..=b'f' => Ok(b - b'a' + 10),
        b @ b'A'..=b'F' => Ok(b - b'A' + 10),
        found => Err(ParseError::Unexpected {
            found,
            expected: "hex digit",
        }),
    }
}

fn push_limited(buf: &mut Vec<u8>, byte: u8, what: &'static str) -> ParseResult<()> {
    if buf.len() == MAX_ELEMENT_LEN {
        return Err(ParseError::TooLong {
            what,
            limit: MAX_ELEMENT_LEN,
        });
    }
    buf.push(byte);
    Ok(())
}

/// `tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///          "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA`
pub fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

// pchar minus pct-encoded: unreserved / sub-delims / ":" / "@"
fn is_pchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-._~!$&'()*+,;=:@".contains(&b)
}

// VCHAR / obs-text
fn is_field_vchar(b: u8) -> bool {
    matches!(b, 0x21..=0x7E | 0x80..=0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;

    fn cursor(raw: &[u8]) -> ByteCursor<&[u8]> {
        ByteCursor::new(raw)
    }

    async fn parse(raw: &[u8]) -> ParseResult<Request> {
        parse_message(&mut cursor(raw)).await
    }

    // ── request-target ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn root_is_one_empty_segment() {
        let mut c = cursor(b"/ ");
        let (segments, query) = parse_request_target(&mut c).await.unwrap();
        assert_eq!(segments, vec![""]);
        assert_eq!(query, None);
    }

    #[tokio::test]
    async fn segments_stop_at_space() {
        let mut c = cursor(b"/a/b.txt/ HTTP");
        let (segments, _) = parse_origin_form(&mut c).await.unwrap();
        assert_eq!(segments, vec!["a", "b.txt", ""]);
        assert_eq!(c.next().await.unwrap(), b' ');
    }

    #[tokio::test]
    async fn encoded_slash_stays_in_segment() {
        let mut c = cursor(b"/a%2Fb ");
        let (segments, _) = parse_origin_form(&mut c).await.unwrap();
        assert_eq!(segments, vec!["a/b"]);
    }

    #[tokio::test]
    async fn percent_decoding_mixed_case_hex() {
        let mut c = cursor(b"/%48%69%2f%7e ");
        assert_eq!(parse_segment(&mut c).await.unwrap(), "Hi/~");
    }

    #[tokio::test]
    async fn percent_decoding_multibyte_utf8() {
        let mut c = cursor(b"/caf%C3%A9 ");
        assert_eq!(parse_segment(&mut c).await.unwrap(), "café");
    }

    #[tokio::test]
    async fn percent_decoding_invalid_utf8() {
        let mut c = cursor(b"/%FF ");
        assert!(matches!(
            parse_segment(&mut c).await,
            Err(ParseError::InvalidUtf8)
        ));
    }

    #[tokio::test]
    async fn bad_hex_digit() {
        let mut c = cursor(b"/%G1 ");
        assert!(matches!(
            parse_segment(&mut c).await,
            Err(ParseError::Unexpected { found: b'G', .. })
        ));
    }

    #[tokio::test]
    async fn query_is_kept_raw() {
        let mut c = cursor(b"/search?q=a%20b&x=/y? ");
        let (segments, query) = parse_origin_form(&mut c).await.unwrap();
        assert_eq!(segments, vec!["search"]);
        assert_eq!(query.as_deref(), Some("q=a%20b&x=/y?"));
    }

    #[tokio::test]
    async fn absolute_form_is_unsupported() {
        let mut c = cursor(b"http://example.com/ ");
        assert!(matches!(
            parse_request_target(&mut c).await,
            Err(ParseError::UnsupportedTarget(TargetForm::AbsoluteOrAuthority))
        ));
    }

    #[tokio::test]
    async fn asterisk_form_is_unsupported() {
        let mut c = cursor(b"* ");
        assert!(matches!(
            parse_request_target(&mut c).await,
            Err(ParseError::UnsupportedTarget(TargetForm::Asterisk))
        ));
    }

    #[tokio::test]
    async fn other_leading_byte_is_protocol_error() {
        let mut c = cursor(b"%2F ");
        assert!(matches!(
            parse_request_target(&mut c).await,
            Err(ParseError::Unexpected { found: b'%', .. })
        ));
    }

    // ── version / token ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn version_packs_nibbles() {
        let mut c = cursor(b"HTTP/2.0");
        let v = parse_http_version(&mut c).await.unwrap();
        assert_eq!(v.as_u8(), 0x20);
    }

    #[tokio::test]
    async fn version_rejects_multi_digit() {
        let mut c = cursor(b"HTTP/11.1");
        assert!(matches!(
            parse_http_version(&mut c).await,
            Err(ParseError::UnexpectedByte { found: b'1', expected: b'.' })
        ));
    }

    #[tokio::test]
    async fn token_charset() {
        let mut c = cursor(b"X-Custom_Name.v2~!: ");
        assert_eq!(
            parse_token(&mut c, "field name").await.unwrap(),
            "X-Custom_Name.v2~!"
        );
        assert_eq!(c.peek().await.unwrap(), b':');
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let mut c = cursor(b" / HTTP/1.1\r\n");
        assert!(matches!(
            parse_token(&mut c, "method token").await,
            Err(ParseError::Unexpected { found: b' ', expected: "method token" })
        ));
    }

    // ── header fields ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn header_value_is_trimmed() {
        let mut c = cursor(b"Host: \t example.com  \t\r\n");
        let field = parse_header_field(&mut c).await.unwrap();
        assert_eq!(field.name, "Host");
        assert_eq!(field.value, "example.com");
        c.expect(b"\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn header_value_keeps_inner_whitespace() {
        let mut c = cursor(b"User-Agent:curl/8.0 (x86 64)\r\n");
        let field = parse_header_field(&mut c).await.unwrap();
        assert_eq!(field.value, "curl/8.0 (x86 64)");
    }

    #[tokio::test]
    async fn empty_header_value() {
        let mut c = cursor(b"X-Empty:   \r\n");
        let field = parse_header_field(&mut c).await.unwrap();
        assert_eq!(field.value, "");
    }

    #[tokio::test]
    async fn space_before_colon_is_rejected() {
        let mut c = cursor(b"Host : a\r\n");
        assert!(matches!(
            parse_header_field(&mut c).await,
            Err(ParseError::UnexpectedByte { found: b' ', expected: b':' })
        ));
    }

    // ── full messages ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn full_request_stops_before_body() {
        let raw = b"POST /submit HTTP/1.1\r\nHost: a\r\nContent-Length: 5\r\n\r\nhello";
        let mut c = cursor(raw);
        let request = parse_message(&mut c).await.unwrap();
        assert_eq!(request.method_str(), "POST");
        assert_eq!(request.segments(), ["submit"]);
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.headers().get("content-length"), Some("5"));
        assert!(request.body().is_empty());
        assert_eq!(&c.read_exact(5).await.unwrap()[..], b"hello");
    }

    #[tokio::test]
    async fn repeated_headers_accumulate() {
        let raw = b"GET / HTTP/1.1\r\nAccept: a\r\nHost: h\r\naccept: b\r\n\r\n";
        let request = parse(raw).await.unwrap();
        let values: Vec<_> = request.headers().get_all("Accept").collect();
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(request.headers().names().collect::<Vec<_>>(), vec!["Accept", "Host"]);
    }

    #[tokio::test]
    async fn missing_crlf_after_request_line() {
        let raw = b"GET / HTTP/1.1\nHost: a\r\n\r\n";
        assert!(matches!(
            parse(raw).await,
            Err(ParseError::UnexpectedByte { found: b'\n', expected: b'\r' })
        ));
    }

    #[tokio::test]
    async fn truncated_headers() {
        let raw = b"GET / HTTP/1.1\r\nHost: a\r\n";
        assert!(matches!(parse(raw).await, Err(ParseError::EndOfStream)));
    }

    #[tokio::test]
    async fn too_many_headers() {
        let mut raw = b"GET / HTTP/1.1\r\n".to_vec();
        for i in 0..=MAX_HEADERS {
            raw.extend_from_slice(format!("X-{i}: v\r\n").as_bytes());
        }
        raw.extend_from_slice(b"\r\n");
        assert!(matches!(
            parse(&raw).await,
            Err(ParseError::TooManyHeaders { limit: MAX_HEADERS })
        ));
    }

    #[tokio::test]
    async fn overlong_segment() {
        let mut raw = b"GET /".to_vec();
        raw.extend(std::iter::repeat_n(b'a', MAX_ELEMENT_LEN + 1));
        raw.extend_from_slice(b" HTTP/1.1\r\n\r\n");
        assert!(matches!(
            parse(&raw).await,
            Err(ParseError::TooLong { what: "path segment", .. })
        ));
    }

    #[tokio::test]
    async fn overlong_method() {
        let mut raw = vec![b'G'; MAX_ELEMENT_LEN + 1];
        raw.extend_from_slice(b" / HTTP/1.1\r\n\r\n");
        assert!(matches!(
            parse(&raw).await,
            Err(ParseError::TooLong { what: "method token", .. })
        ));
    }

    #[tokio::test]
    async fn overlong_field_name() {
        let mut raw = b"GET / HTTP/1.1\r\n".to_vec();
        raw.extend(std::iter::repeat_n(b'X', MAX_ELEMENT_LEN + 1));
        raw.extend_from_slice(b": v\r\n\r\n");
        assert!(matches!(
            parse(&raw).await,
            Err(ParseError::TooLong { what: "field name", .. })
        ));
    }

    #[tokio::test]
    async fn overlong_field_value() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
        raw.extend(std::iter::repeat_n(b'v', MAX_ELEMENT_LEN + 1));
        raw.extend_from_slice(b"\r\n\r\n");
        assert!(matches!(
            parse(&raw).await,
            Err(ParseError::TooLong { what: "field value", .. })
        ));
    }

    #[tokio::test]
    async fn field_value_at_limit_is_accepted() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
        raw.extend(std::iter::repeat_n(b'v', MAX_ELEMENT_LEN));
        raw.extend_from_slice(b"\r\n\r\n");
        let request = parse(&raw).await.unwrap();
        assert_eq!(request.headers().get("x-big").map(str::len), Some(MAX_ELEMENT_LEN));
    }

    #[tokio::test]
    async fn overlong_query() {
        let mut raw = b"GET /?".to_vec();
        raw.extend(std::iter::repeat_n(b'q', MAX_ELEMENT_LEN + 1));
        raw.extend_from_slice(b" HTTP/1.1\r\n\r\n");
        assert!(matches!(
            parse(&raw).await,
            Err(ParseError::TooLong { what: "query", .. })
        ));
    }

    // ── status-line ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn status_line_skips_reason() {
        let mut c = cursor(b"HTTP/1.1 404 Not Found\r\nrest");
        let line = parse_status_line(&mut c).await.unwrap();
        assert_eq!(line.version, Version::HTTP_11);
        assert_eq!(line.status, StatusCode::NOT_FOUND);
        assert_eq!(c.next().await.unwrap(), b'r');
    }

    #[tokio::test]
    async fn status_line_without_reason() {
        let mut c = cursor(b"HTTP/1.0 200\r\n");
        let line = parse_status_line(&mut c).await.unwrap();
        assert_eq!(line.version, Version::HTTP_10);
        assert_eq!(line.status.as_u16(), 200);
    }

    #[tokio::test]
    async fn status_line_overlong_reason() {
        let mut raw = b"HTTP/1.1 200 ".to_vec();
        raw.extend(std::iter::repeat_n(b'r', MAX_ELEMENT_LEN + 1));
        raw.extend_from_slice(b"\r\n");
        let mut c = ByteCursor::new(&raw[..]);
        assert!(matches!(
            parse_status_line(&mut c).await,
            Err(ParseError::TooLong { what: "reason phrase", .. })
        ));
    }

    #[tokio::test]
    async fn status_line_reason_at_limit() {
        let mut raw = b"HTTP/1.1 200 ".to_vec();
        raw.extend(std::iter::repeat_n(b'r', MAX_ELEMENT_LEN));
        raw.extend_from_slice(b"\r\n");
        let mut c = ByteCursor::new(&raw[..]);
        assert_eq!(parse_status_line(&mut c).await.unwrap().status, StatusCode::OK);
    }

    #[tokio::test]
    async fn status_line_round_trip() {
        for code in [200u16, 299, 417, 505] {
            let bytes = Response::new(code).body("x").to_bytes();
            let mut c = ByteCursor::new(&bytes[..]);
            let line = parse_status_line(&mut c).await.unwrap();
            assert_eq!(line.status.as_u16(), code);
            assert_eq!(line.version, Version::HTTP_11);
        }
    }
}
