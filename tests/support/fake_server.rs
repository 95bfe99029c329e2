//! In-process TCP server that answers each accepted connection with a
//! scripted reply and records the raw request it received.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::socket_guard::should_skip_socket_bound_test;

/// What the server does with one accepted connection.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Reads the request, writes these bytes in one call, closes.
    Bytes(Vec<u8>),
    /// Reads the request and keeps the connection open, silent, for a while.
    Hang(Duration),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}

pub struct FakeServer {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeServer {
    /// Starts a server answering one connection per reply, in order.
    ///
    /// Returns `None` when localhost sockets are unavailable.
    #[track_caller]
    pub fn start(replies: Vec<Reply>) -> Option<Self> {
        if should_skip_socket_bound_test() {
            return None;
        }
        let listener = TcpListener::bind("127.0.0.1:0").ok()?;
        let port = listener.local_addr().ok()?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for reply in replies {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let request = read_request(&mut stream);
                recorded.lock().expect("requests lock").push(request);
                match reply {
                    Reply::Bytes(bytes) => {
                        let _ = stream.write_all(&bytes);
                        let _ = stream.flush();
                    }
                    Reply::Hang(duration) => {
                        thread::spawn(move || {
                            thread::sleep(duration);
                            drop(stream);
                        });
                    }
                }
            }
        });

        Some(Self { port, requests })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Raw requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

/// Reads until the blank line that ends the header block.
fn read_request(stream: &mut TcpStream) -> String {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut received = Vec::new();
    let mut chunk = [0_u8; 4096];
    while !received.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => received.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&received).into_owned()
}

/// Returns a port on 127.0.0.1 that nothing is listening on.
#[allow(dead_code)]
pub fn closed_port() -> Option<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").ok()?;
    let port = listener.local_addr().ok()?.port();
    drop(listener);
    Some(port)
}
