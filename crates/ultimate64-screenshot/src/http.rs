//! Minimal HTTP/1.1 client.
//!
//! The Ultimate 64 REST surface is four fixed requests with raw-byte bodies,
//! so this speaks just enough HTTP for those: one connection per request
//! (`Connection: close`), a status line, headers, and a `Content-Length` or
//! read-to-close body. Absolute timeouts on connect, read, and write keep a
//! lost device from hanging a capture.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Absolute per-request timeout, applied to connect, read, and write.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A parsed HTTP response: status code and raw body bytes.
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issue a single request. `host` is `ip` or `ip:port` (port 80 assumed);
/// `target` is the path plus any query string; `headers` are extra request
/// headers; `body`, when present, is sent verbatim with its length.
pub fn request(
    host: &str,
    method: &str,
    target: &str,
    headers: &[(&str, &str)],
    body: Option<&[u8]>,
) -> io::Result<Response> {
    let authority = if host.contains(':') {
        host.to_owned()
    } else {
        format!("{host}:80")
    };
    let addr = authority
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host did not resolve"))?;

    let mut stream = TcpStream::connect_timeout(&addr, REQUEST_TIMEOUT)?;
    stream.set_read_timeout(Some(REQUEST_TIMEOUT))?;
    stream.set_write_timeout(Some(REQUEST_TIMEOUT))?;

    let mut head = format!("{method} {target} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n");
    for (name, value) in headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    if let Some(body) = body {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    } else if method != "GET" {
        head.push_str("Content-Length: 0\r\n");
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes())?;
    if let Some(body) = body {
        stream.write_all(body)?;
    }
    stream.flush()?;

    read_response(stream)
}

fn read_response(stream: TcpStream) -> io::Result<Response> {
    let mut reader = BufReader::new(stream);

    let mut status_line = String::new();
    reader.read_line(&mut status_line)?;
    let status = parse_status_line(&status_line)?;

    // Headers: only Content-Length matters here
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().ok();
            }
        }
    }

    let body = match content_length {
        Some(length) => {
            let mut body = vec![0u8; length];
            reader.read_exact(&mut body)?;
            body
        }
        None => {
            // Connection: close — the body runs to end of stream
            let mut body = Vec::new();
            reader.read_to_end(&mut body)?;
            body
        }
    };

    Ok(Response { status, body })
}

fn parse_status_line(line: &str) -> io::Result<u16> {
    let bad = || io::Error::new(io::ErrorKind::InvalidData, format!("bad status line: {line:?}"));
    let mut parts = line.split_whitespace();
    let version = parts.next().ok_or_else(bad)?;
    if !version.starts_with("HTTP/") {
        return Err(bad());
    }
    parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())
}
