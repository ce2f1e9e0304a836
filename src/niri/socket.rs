//! Framing for niri's request socket and a small connection pool.
//!
//! Every request is one line of JSON; niri answers it with exactly one line
//! holding `{"Ok": ...}` or `{"Err": "..."}` and then closes the connection.
//! After an `"EventStream"` request the connection instead stays open and
//! switches to an endless sequence of event objects.

use super::NiriError;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Requests the daemon sends.
#[derive(Debug, Clone, Serialize)]
pub enum Request {
    EventStream,
    FocusedWindow,
    Action(Action),
}

/// Compositor actions.
#[derive(Debug, Clone, Serialize)]
pub enum Action {
    MoveWindowToWorkspace {
        window_id: u64,
        reference: WorkspaceReference,
        focus: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub enum WorkspaceReference {
    Id(u64),
}

#[derive(Deserialize)]
enum Reply {
    Ok(Value),
    Err(String),
}

/// One connection to the niri socket.
pub struct NiriSocket {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
}

impl NiriSocket {
    pub fn connect(path: &Path) -> Result<Self, NiriError> {
        let writer = UnixStream::connect(path).map_err(|e| {
            NiriError::Protocol(format!("connect to {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(writer.try_clone()?);
        Ok(Self { reader, writer })
    }

    /// Write `request` as a single line.
    pub fn send(&mut self, request: &Request) -> Result<(), NiriError> {
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read the one-line reply to the last request.
    pub fn read_reply(&mut self) -> Result<Value, NiriError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(NiriError::Closed);
        }
        match serde_json::from_str::<Reply>(&line)? {
            Reply::Ok(value) => Ok(value),
            Reply::Err(msg) => Err(NiriError::Reply(msg)),
        }
    }

    pub fn request(&mut self, request: &Request) -> Result<Value, NiriError> {
        self.send(request)?;
        self.read_reply()
    }

    /// A second handle on the underlying stream, used to shut it down from
    /// another thread.
    pub fn shutdown_handle(&self) -> Result<UnixStream, NiriError> {
        Ok(self.writer.try_clone()?)
    }

    /// Give up the write side and keep the buffered reader.
    pub fn into_reader(self) -> BufReader<UnixStream> {
        self.reader
    }
}

/// Reusable request connections.
///
/// A connection goes back to the pool only after a request completed with a
/// well-framed reply; anything else drops it.  niri closes a request
/// connection after answering, so an idle connection may already be dead: a
/// request that fails on a pooled connection with an I/O error or an early
/// close is retried once on a freshly dialed one.
pub struct SocketPool {
    path: PathBuf,
    idle: Mutex<Vec<NiriSocket>>,
}

impl SocketPool {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            idle: Mutex::new(Vec::new()),
        }
    }

    fn pop_idle(&self) -> Option<NiriSocket> {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }

    fn release(&self, socket: NiriSocket) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(socket);
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Send `request` and return the `Ok` payload.
    ///
    /// An idle connection is tried first; if it turns out to be stale the
    /// request goes out again on a new connection.
    pub fn request(&self, request: &Request) -> Result<Value, NiriError> {
        if let Some(mut socket) = self.pop_idle() {
            match socket.request(request) {
                Err(e) if e.is_stale_connection() => {
                    debug!("pooled niri connection is stale ({}), redialing", e);
                }
                result => return self.finish(socket, result),
            }
        }
        let mut socket = NiriSocket::connect(&self.path)?;
        let result = socket.request(request);
        self.finish(socket, result)
    }

    /// Keep `socket` if its reply was read in full.
    fn finish(
        &self,
        socket: NiriSocket,
        result: Result<Value, NiriError>,
    ) -> Result<Value, NiriError> {
        if matches!(result, Ok(_) | Err(NiriError::Reply(_))) {
            self.release(socket);
        }
        result
    }
}
