// JSON-RPC over a Unix domain socket.
//
// Framing is newline-delimited JSON: one request line, one response line,
// one connection per call.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::warn;

use super::{decode_response, RequestIds, Transport, TransportError};

#[derive(Debug)]
pub struct SocketTransport {
    socket_path: PathBuf,
    ids: RequestIds,
}

impl SocketTransport {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path, ids: RequestIds::default() }
    }

    async fn call_once(&self, method: &'static str, params: Value) -> Result<Value, TransportError> {
        let request = self.ids.next_request(method, params);
        let mut payload = serde_json::to_vec(&request).map_err(|error| {
            TransportError::Protocol(format!("failed to serialize json-rpc request: {error}"))
        })?;
        payload.push(b'\n');

        let stream = UnixStream::connect(&self.socket_path).await.map_err(|error| {
            warn!(method, socket = %self.socket_path.display(), %error, "socket connect failed");
            self.io_error("failed to connect to service socket", error)
        })?;

        let (read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(&payload)
            .await
            .map_err(|error| self.io_error("failed writing json-rpc request", error))?;
        write_half
            .flush()
            .await
            .map_err(|error| self.io_error("failed flushing json-rpc request", error))?;

        let mut reader = BufReader::new(read_half);
        let mut response_line = Vec::new();
        reader
            .read_until(b'\n', &mut response_line)
            .await
            .map_err(|error| self.io_error("failed reading json-rpc response", error))?;

        if response_line.is_empty() {
            return Err(TransportError::Unavailable(format!(
                "service socket `{}` closed before responding",
                self.socket_path.display()
            )));
        }

        decode_response(&response_line)
    }

    fn io_error(&self, context: &str, error: io::Error) -> TransportError {
        TransportError::Unavailable(format!(
            "{context} (socket `{}`): {error}",
            self.socket_path.display()
        ))
    }
}

impl Transport for SocketTransport {
    fn send(
        &self,
        method: &'static str,
        params: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        self.call_once(method, params)
    }
}
