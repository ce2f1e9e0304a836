//! Unix-socket [`InputSource`] for control commands.
//!
//! Binds a Unix stream socket and accepts connections in a loop.  Every
//! connection is handled on its own thread: at most
//! [`MAX_COMMAND_SIZE`](super::MAX_COMMAND_SIZE) bytes are read, the first
//! JSON value is decoded as a [`ControlCommand`] and forwarded, and the
//! connection is closed.  A stuck client therefore never holds up the next
//! one.

use super::{ControlError, MAX_COMMAND_SIZE};
use crate::command::{ControlCommand, Input};
use crate::traits::InputSource;
use log::{debug, error, info};
use std::io::{ErrorKind, Read};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// An [`InputSource`] that listens on a Unix stream socket for JSON-encoded
/// control commands.
///
/// The socket file is removed when the listener is dropped.
pub struct ControlListener {
    path: PathBuf,
    listener: Option<UnixListener>,
    stopped: Arc<AtomicBool>,
}

/// Stops a running [`ControlListener`] from another thread.
#[derive(Clone)]
pub struct ControlStop {
    path: PathBuf,
    stopped: Arc<AtomicBool>,
}

impl ControlStop {
    /// Ask the accept loop to exit.
    ///
    /// The loop is parked in `accept`, so a throwaway connection wakes it.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let _ = UnixStream::connect(&self.path);
        }
    }
}

impl ControlListener {
    /// Remove a stale socket at `path` and bind a new one.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, ControlError> {
        let path = path.as_ref().to_path_buf();
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("removed stale socket {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ControlError::StaleSocket {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
        let listener = UnixListener::bind(&path)?;
        info!("listening on {}", path.display());
        Ok(Self {
            path,
            listener: Some(listener),
            stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stop_handle(&self) -> ControlStop {
        ControlStop {
            path: self.path.clone(),
            stopped: Arc::clone(&self.stopped),
        }
    }
}

impl Drop for ControlListener {
    fn drop(&mut self) {
        if std::fs::remove_file(&self.path).is_ok() {
            debug!("removed socket {}", self.path.display());
        }
    }
}

/// Read and decode one command from `stream`.
fn read_command<R: Read>(stream: R) -> Result<ControlCommand, ControlError> {
    let limited = stream.take(MAX_COMMAND_SIZE);
    let mut commands = serde_json::Deserializer::from_reader(limited).into_iter::<ControlCommand>();
    match commands.next() {
        Some(cmd) => Ok(cmd?),
        None => Err(ControlError::Empty),
    }
}

fn handle_connection(stream: UnixStream, sink: mpsc::Sender<Input>) {
    match read_command(&stream) {
        Ok(cmd) => {
            debug!("received {:?}", cmd);
            if sink.send(Input::Control(cmd)).is_err() {
                debug!("input queue closed, dropping {:?}", cmd);
            }
        }
        Err(e) => error!("failed to handle connection: {}", e),
    }
}

impl InputSource for ControlListener {
    type Error = ControlError;

    /// Accept connections until stopped.
    ///
    /// This method **blocks**.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Input>) -> Result<(), Self::Error> {
        let listener = self.listener.take().ok_or(ControlError::AlreadyRunning)?;

        for stream in listener.incoming() {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    let sink = sink.clone();
                    std::thread::spawn(move || handle_connection(stream, sink));
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
        info!("control socket closed");
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::StickyAction;
    use crate::niri::socket::tests::tmp_socket_path;
    use std::io::Write;
    use std::time::Duration;

    fn spawn_listener(path: &Path) -> (ControlStop, mpsc::Receiver<Input>, std::thread::JoinHandle<()>) {
        let mut listener = ControlListener::bind(path).expect("bind");
        let stop = listener.stop_handle();
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            let _ = listener.run(tx);
        });
        (stop, rx, handle)
    }

    #[test]
    fn command_over_socket() {
        let path = tmp_socket_path("ctl");
        let (stop, rx, handle) = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"action":"toggle_sticky","window_id":42}}"#).unwrap();
        }

        let input = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            input,
            Input::Control(ControlCommand {
                action: StickyAction::Toggle,
                window_id: 42,
            })
        );

        stop.stop();
        handle.join().unwrap();
        assert!(!path.exists(), "socket file is removed on shutdown");
    }

    #[test]
    fn malformed_command_does_not_stop_the_listener() {
        let path = tmp_socket_path("ctl-bad");
        let (stop, rx, handle) = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "not json at all").unwrap();
        }
        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"action":"sticky","window_id":1}}"#).unwrap();
        }
        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"action":"set_sticky","window_id":7}}"#).unwrap();
        }

        let input = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            input,
            Input::Control(ControlCommand {
                action: StickyAction::Set,
                window_id: 7,
            })
        );
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        stop.stop();
        handle.join().unwrap();
    }

    #[test]
    fn hung_client_does_not_block_others() {
        let path = tmp_socket_path("ctl-hung");
        let (stop, rx, handle) = spawn_listener(&path);

        // Connects and never writes.
        let _hung = UnixStream::connect(&path).expect("connect");
        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"action":"unset_sticky","window_id":3}}"#).unwrap();
        }

        let input = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(input, Input::Control(ControlCommand { window_id: 3, .. })));

        stop.stop();
        handle.join().unwrap();
    }

    #[test]
    fn oversized_command_is_rejected() {
        let padding = " ".repeat(MAX_COMMAND_SIZE as usize);
        let msg = format!(r#"{{"action":"set_sticky",{}"window_id":1}}"#, padding);
        assert!(read_command(msg.as_bytes()).is_err());
    }

    #[test]
    fn empty_connection_is_an_error() {
        assert!(matches!(read_command(&b""[..]), Err(ControlError::Empty)));
    }

    #[test]
    fn bind_replaces_stale_socket() {
        let path = tmp_socket_path("ctl-stale");
        std::fs::write(&path, b"stale").unwrap();
        let listener = ControlListener::bind(&path).expect("bind over stale file");
        assert_eq!(listener.path(), path.as_path());
        drop(listener);
        assert!(!path.exists());
    }
}
