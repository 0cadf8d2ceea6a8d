//! Minimal HTTP/1.1 server that sends part of a body and then stalls.
//!
//! Used to abort a transfer while its body is still streaming.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

/// Starts a server in a background thread. Every GET is answered with a
/// `Content-Length` of `total` but only `sent` bytes are written before the
/// connection stalls. Returns the base URL (e.g. "http://127.0.0.1:12345").
pub fn start(total: usize, sent: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                let mut request = Vec::new();
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {total}\r\nContent-Type: application/octet-stream\r\n\r\n"
                );
                if stream.write_all(header.as_bytes()).is_err() {
                    return;
                }
                let _ = stream.write_all(&vec![b'x'; sent]);
                let _ = stream.flush();
                thread::sleep(Duration::from_secs(30));
            });
        }
    });
    format!("http://127.0.0.1:{port}")
}
