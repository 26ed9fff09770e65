#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use resbridge_query::ClientConfig;

/// One action of the scripted server after it has read the request.
#[derive(Debug, Clone)]
pub enum Step {
    Send(Vec<u8>),
    Pause(Duration),
    /// Read exactly this many bytes from the client.
    Receive(usize),
    Close,
}

/// What the server saw on one connection.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub request: String,
    pub received: Vec<u8>,
}

/// A loopback server that answers each accepted connection with the next script.
pub struct ScriptedServer {
    pub port: u16,
    handle: JoinHandle<Vec<Captured>>,
}

impl ScriptedServer {
    pub fn start(scripts: Vec<Vec<Step>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("loopback bind should work");
        let port = listener.local_addr().expect("bound address").port();
        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for script in scripts {
                let (stream, _) = listener.accept().expect("client should connect");
                captured.push(serve(stream, script));
            }
            captured
        });
        Self { port, handle }
    }

    pub fn single(script: Vec<Step>) -> Self {
        Self::start(vec![script])
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            port: self.port,
            ..quick_config()
        }
    }

    pub fn finish(self) -> Vec<Captured> {
        self.handle.join().expect("server thread should not panic")
    }
}

fn serve(mut stream: TcpStream, script: Vec<Step>) -> Captured {
    let mut captured = Captured {
        request: read_request(&mut stream),
        received: Vec::new(),
    };
    for step in script {
        match step {
            Step::Send(bytes) => {
                // The client may already have given up.
                if stream.write_all(&bytes).is_err() {
                    break;
                }
            }
            Step::Pause(duration) => thread::sleep(duration),
            Step::Receive(n) => {
                let mut buf = vec![0u8; n];
                if stream.read_exact(&mut buf).is_err() {
                    break;
                }
                captured.received.extend_from_slice(&buf);
            }
            Step::Close => break,
        }
    }
    captured
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut len = [0u8; 8];
    stream.read_exact(&mut len).expect("request length prefix");
    let len = i64::from_be_bytes(len) as usize;
    let mut text = vec![0u8; len];
    stream.read_exact(&mut text).expect("request text");
    text.iter().map(|&b| char::from(b)).collect()
}

/// Short budgets so failure paths finish quickly.
pub fn quick_config() -> ClientConfig {
    ClientConfig {
        connect_timeout: Duration::from_secs(2),
        header_timeout: Duration::from_secs(2),
        chunk_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(10),
        ..ClientConfig::default()
    }
}

pub fn header(fields: &[u64]) -> Vec<u8> {
    fields.iter().flat_map(|f| f.to_be_bytes()).collect()
}

pub fn f64s(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Catalog string: `u32` BE length in bytes, then UTF-16BE.
pub fn text(value: &str) -> Vec<u8> {
    let units: Vec<u8> = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
    let mut out = (units.len() as u32).to_be_bytes().to_vec();
    out.extend(units);
    out
}

/// Split `bytes` into `Send` steps of at most `size` bytes with short pauses.
pub fn fragmented(bytes: &[u8], size: usize) -> Vec<Step> {
    bytes
        .chunks(size)
        .flat_map(|chunk| [Step::Send(chunk.to_vec()), Step::Pause(Duration::from_millis(1))])
        .collect()
}
