//! In-process stand-ins for the store, used by unit tests.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::StoreConfig;

type Data = Arc<Mutex<HashMap<String, String>>>;

/// Store settings pointing at `addr` with short timeouts and no reconnect retries.
pub fn store_config(addr: SocketAddr) -> StoreConfig {
    let mut config = StoreConfig::new(addr.ip().to_string(), addr.port());
    config.connect_timeout = Duration::from_millis(500);
    config.command_timeout = Duration::from_millis(500);
    config.max_retries = 0;
    config
}

/// A fake store that answers PING, SET and GET and acknowledges everything
/// else (handshake commands included). It can be stopped and started again
/// on the same address to simulate an outage.
pub struct FakeStore {
    addr: SocketAddr,
    data: Data,
    server: Option<JoinHandle<()>>,
}

impl FakeStore {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let data: Data = Arc::default();
        let server = Some(tokio::spawn(accept_loop(listener, data.clone())));
        Self { addr, data, server }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Close the listener and every open connection.
    pub async fn stop(&mut self) {
        if let Some(server) = self.server.take() {
            server.abort();
            let _ = server.await;
        }
    }

    /// Listen again on the original address, keeping the stored data.
    pub async fn restart(&mut self) {
        self.stop().await;
        let listener = TcpListener::bind(self.addr).await.unwrap();
        self.server = Some(tokio::spawn(accept_loop(listener, self.data.clone())));
    }
}

/// Start a fake store that runs for the rest of the test.
pub async fn spawn_fake_store() -> SocketAddr {
    FakeStore::start().await.addr()
}

// Connections live in the JoinSet, so aborting this task closes them too.
async fn accept_loop(listener: TcpListener, data: Data) {
    let mut connections = JoinSet::new();
    while let Ok((socket, _)) = listener.accept().await {
        connections.spawn(serve_connection(socket, data.clone()));
    }
}

/// Start a peer that accepts connections and never writes a byte back.
pub async fn spawn_silent_store() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn serve_connection(socket: TcpStream, data: Data) {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    while let Ok(Some(args)) = read_command(&mut reader).await {
        let reply = respond(&args, &data);
        if writer.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

fn respond(args: &[String], data: &Mutex<HashMap<String, String>>) -> String {
    let name = args
        .first()
        .map(|s| s.to_ascii_uppercase())
        .unwrap_or_default();

    match (name.as_str(), args) {
        ("PING", _) => "+PONG\r\n".to_string(),
        ("SET", [_, key, value, ..]) => {
            data.lock().unwrap().insert(key.clone(), value.clone());
            "+OK\r\n".to_string()
        }
        ("GET", [_, key]) => match data.lock().unwrap().get(key) {
            Some(value) => format!("${}\r\n{}\r\n", value.len(), value),
            None => "$-1\r\n".to_string(),
        },
        _ => "+OK\r\n".to_string(),
    }
}

/// Read one array-of-bulk-strings command. `Ok(None)` on a clean EOF.
async fn read_command<R>(reader: &mut R) -> io::Result<Option<Vec<String>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let count = parse_header(&line, '*')?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await?;
        let len = parse_header(&line, '$')?;

        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(Some(args))
}

fn parse_header(line: &str, marker: char) -> io::Result<usize> {
    line.trim_end()
        .strip_prefix(marker)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("bad header: {line:?}")))
}
