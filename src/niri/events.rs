//! Translates niri's event stream into dispatcher [`Input`]s.
//!
//! After an `"EventStream"` request and its `{"Ok":"Handled"}` reply, niri
//! writes one externally tagged JSON object per event:
//!
//! | Event                   | Payload                          |
//! |-------------------------|----------------------------------|
//! | `WorkspacesChanged`     | `{"workspaces": [Workspace]}`    |
//! | `WorkspaceActivated`    | `{"id": u64, "focused": bool}`   |
//! | `WindowsChanged`        | `{"windows": [Window]}`          |
//! | `WindowOpenedOrChanged` | `{"window": Window}`             |
//! | `WindowClosed`          | `{"id": u64}`                    |
//!
//! Every other event kind is skipped.  A JSON syntax error, or one of the
//! kinds above with a body that does not decode, ends the stream; the source
//! then reconnects, and niri replays full workspace and window snapshots on
//! the new stream.

use super::socket::{NiriSocket, Request};
use super::NiriError;
use crate::command::{CompositorEvent, Input, Window, Workspace};
use crate::traits::InputSource;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::Duration;

/// Event kinds the dispatcher reacts to.
const HANDLED_EVENTS: &[&str] = &[
    "WorkspacesChanged",
    "WorkspaceActivated",
    "WindowsChanged",
    "WindowOpenedOrChanged",
    "WindowClosed",
];

/// Pause before re-acquiring a broken stream.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Deserialize)]
enum NiriEvent {
    WorkspacesChanged {
        workspaces: Vec<Workspace>,
    },
    WorkspaceActivated {
        #[serde(alias = "workspace_id")]
        id: u64,
    },
    WindowsChanged {
        windows: Vec<Window>,
    },
    WindowOpenedOrChanged {
        window: Window,
    },
    WindowClosed {
        #[serde(alias = "window_id")]
        id: u64,
    },
}

impl From<NiriEvent> for CompositorEvent {
    fn from(event: NiriEvent) -> Self {
        match event {
            NiriEvent::WorkspacesChanged { workspaces } => {
                CompositorEvent::WorkspacesChanged(workspaces)
            }
            NiriEvent::WorkspaceActivated { id } => CompositorEvent::WorkspaceActivated(id),
            NiriEvent::WindowsChanged { windows } => CompositorEvent::WindowsChanged(windows),
            NiriEvent::WindowOpenedOrChanged { window } => {
                CompositorEvent::WindowOpenedOrChanged(window)
            }
            NiriEvent::WindowClosed { id } => CompositorEvent::WindowClosed(id),
        }
    }
}

/// Decode one stream value.
///
/// Returns `Ok(None)` for event kinds the daemon does not care about.
fn decode_event(value: Value) -> Result<Option<CompositorEvent>, serde_json::Error> {
    let kind = match value.as_object() {
        Some(obj) if obj.len() == 1 => obj.keys().next().cloned(),
        _ => None,
    };
    match kind {
        Some(kind) if HANDLED_EVENTS.contains(&kind.as_str()) => {
            let event: NiriEvent = serde_json::from_value(value)?;
            Ok(Some(event.into()))
        }
        _ => {
            debug!("ignoring niri event {}", kind.as_deref().unwrap_or("<untagged>"));
            Ok(None)
        }
    }
}

/// Why a stream stopped producing events.
#[derive(Debug, PartialEq, Eq)]
enum StreamEnd {
    /// niri closed the connection.
    Eof,
    /// The dispatcher hung up.
    SinkClosed,
}

/// Forward every decodable event from `reader` into `sink`.
fn forward_events<R: Read>(reader: R, sink: &mpsc::Sender<Input>) -> Result<StreamEnd, NiriError> {
    let values = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();
    for value in values {
        if let Some(event) = decode_event(value?)? {
            if sink.send(Input::Compositor(event)).is_err() {
                return Ok(StreamEnd::SinkClosed);
            }
        }
    }
    Ok(StreamEnd::Eof)
}

/// Open a connection and switch it into event-stream mode.
fn open_stream(path: &Path) -> Result<NiriSocket, NiriError> {
    let mut socket = NiriSocket::connect(path)?;
    socket.request(&Request::EventStream)?;
    Ok(socket)
}

/// Stops a running [`NiriEventSource`] from another thread.
#[derive(Clone)]
pub struct EventStreamStop {
    stopped: Arc<AtomicBool>,
    current: Arc<Mutex<Option<UnixStream>>>,
}

impl EventStreamStop {
    /// Request a stop and shut the live connection down, which unblocks the
    /// reader.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(stream) = current {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn track(&self, stream: UnixStream) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(stream);
    }
}

/// An [`InputSource`] reading niri's event stream.
pub struct NiriEventSource {
    path: PathBuf,
    pending: Option<NiriSocket>,
    stop: EventStreamStop,
    reconnect_delay: Duration,
}

impl NiriEventSource {
    /// Open the event stream right away so a missing compositor is reported
    /// at startup.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, NiriError> {
        let path = path.as_ref().to_path_buf();
        let socket = open_stream(&path)?;
        info!("event stream connected to {}", path.display());
        Ok(Self {
            path,
            pending: Some(socket),
            stop: EventStreamStop {
                stopped: Arc::new(AtomicBool::new(false)),
                current: Arc::new(Mutex::new(None)),
            },
            reconnect_delay: RECONNECT_DELAY,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn stop_handle(&self) -> EventStreamStop {
        self.stop.clone()
    }

    fn next_stream(&mut self) -> Result<NiriSocket, NiriError> {
        match self.pending.take() {
            Some(socket) => Ok(socket),
            None => {
                let socket = open_stream(&self.path)?;
                info!("event stream reconnected to {}", self.path.display());
                Ok(socket)
            }
        }
    }
}

impl InputSource for NiriEventSource {
    type Error = NiriError;

    /// Forward events until stopped or until the dispatcher hangs up.
    ///
    /// A broken stream is re-acquired after a short pause.  This method
    /// **blocks**; run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Input>) -> Result<(), Self::Error> {
        while !self.stop.is_stopped() {
            match self.next_stream() {
                Ok(socket) => {
                    self.stop.track(socket.shutdown_handle()?);
                    // A stop that raced the registration above.
                    if self.stop.is_stopped() {
                        break;
                    }
                    match forward_events(socket.into_reader(), &sink) {
                        Ok(StreamEnd::SinkClosed) => {
                            info!("input queue closed, stopping event stream");
                            return Ok(());
                        }
                        Ok(StreamEnd::Eof) => warn!("niri event stream ended"),
                        Err(e) => {
                            if !self.stop.is_stopped() {
                                error!("niri event stream broke: {}", e);
                            }
                        }
                    }
                }
                Err(e) => error!("cannot open niri event stream: {}", e),
            }
            if self.stop.is_stopped() {
                break;
            }
            std::thread::sleep(self.reconnect_delay);
        }
        debug!("event stream stopped");
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::niri::socket::tests::tmp_socket_path;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;

    fn forward(bytes: &str) -> (Result<StreamEnd, NiriError>, Vec<Input>) {
        let (tx, rx) = mpsc::channel();
        let res = forward_events(bytes.as_bytes(), &tx);
        drop(tx);
        (res, rx.iter().collect())
    }

    #[test]
    fn decodes_handled_events() {
        let stream = r#"
            {"WorkspacesChanged":{"workspaces":[{"id":10,"idx":1,"name":null,"output":"DP-1","is_active":true,"is_focused":true,"active_window_id":null}]}}
            {"WindowsChanged":{"windows":[{"id":1,"title":"t","app_id":"term","workspace_id":10,"is_floating":true}]}}
            {"WorkspaceActivated":{"id":20,"focused":true}}
            {"WindowOpenedOrChanged":{"window":{"id":2,"title":null,"app_id":null,"workspace_id":null,"is_floating":false}}}
            {"WindowClosed":{"id":2}}
        "#;
        let (res, inputs) = forward(stream);
        assert_eq!(res.unwrap(), StreamEnd::Eof);
        assert_eq!(inputs.len(), 5);
        assert_eq!(
            inputs[0],
            Input::Compositor(CompositorEvent::WorkspacesChanged(vec![Workspace {
                id: 10,
                output: Some("DP-1".into()),
            }]))
        );
        assert!(matches!(
            &inputs[1],
            Input::Compositor(CompositorEvent::WindowsChanged(w)) if w.len() == 1 && w[0].is_floating
        ));
        assert_eq!(
            inputs[2],
            Input::Compositor(CompositorEvent::WorkspaceActivated(20))
        );
        assert_eq!(inputs[4], Input::Compositor(CompositorEvent::WindowClosed(2)));
    }

    #[test]
    fn unknown_events_are_skipped() {
        let stream = r#"{"KeyboardLayoutsChanged":{"keyboard_layouts":{"names":[],"current_idx":0}}}
{"WindowFocusChanged":{"id":null}}
"OverviewOpenedOrClosed"
{"WindowClosed":{"id":7}}"#;
        let (res, inputs) = forward(stream);
        assert_eq!(res.unwrap(), StreamEnd::Eof);
        assert_eq!(inputs, vec![Input::Compositor(CompositorEvent::WindowClosed(7))]);
    }

    #[test]
    fn values_need_no_newline_framing() {
        let (res, inputs) = forward(r#"{"WindowClosed":{"id":1}}{"WindowClosed":{"id":2}}"#);
        assert!(res.is_ok());
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn syntax_error_ends_the_stream() {
        let (res, inputs) = forward("{\"WindowClosed\":{\"id\":1}}\n{not json}\n{\"WindowClosed\":{\"id\":2}}");
        assert!(matches!(res, Err(NiriError::Json(_))));
        assert_eq!(inputs.len(), 1);
    }

    #[test]
    fn malformed_handled_event_ends_the_stream() {
        let (res, inputs) = forward(r#"{"WindowClosed":{"id":"seven"}}"#);
        assert!(res.is_err());
        assert!(inputs.is_empty());
    }

    #[test]
    fn closed_sink_is_reported() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let res = forward_events(r#"{"WindowClosed":{"id":1}}"#.as_bytes(), &tx);
        assert_eq!(res.unwrap(), StreamEnd::SinkClosed);
    }

    /// Fake niri that answers the stream request and writes `events` on
    /// every accepted connection, then holds the connection open.
    fn fake_event_stream(path: &Path, events: &'static str) {
        let _ = std::fs::remove_file(path);
        let listener = UnixListener::bind(path).unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { return };
                let mut writer = stream.try_clone().unwrap();
                let mut reader = BufReader::new(stream);
                let mut line = String::new();
                if reader.read_line(&mut line).is_err() {
                    continue;
                }
                assert_eq!(line.trim(), r#""EventStream""#);
                let _ = writeln!(writer, r#"{{"Ok":"Handled"}}"#);
                let _ = writer.write_all(events.as_bytes());
                // Keep the connection open until the reader shuts it down.
                std::thread::spawn(move || {
                    let mut rest = String::new();
                    let _ = reader.read_line(&mut rest);
                });
            }
        });
    }

    #[test]
    fn source_forwards_events_and_stops() {
        let path = tmp_socket_path("events");
        fake_event_stream(&path, "{\"WorkspaceActivated\":{\"id\":3,\"focused\":true}}\n");

        let mut source = NiriEventSource::connect(&path)
            .unwrap()
            .with_reconnect_delay(Duration::from_millis(10));
        let stop = source.stop_handle();
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::spawn(move || source.run(tx));

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, Input::Compositor(CompositorEvent::WorkspaceActivated(3)));

        stop.stop();
        handle.join().unwrap().unwrap();

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn source_reconnects_after_stream_error() {
        let path = tmp_socket_path("reconnect");
        fake_event_stream(&path, "{\"WindowClosed\":{\"id\":4}}\n{broken\n");

        let mut source = NiriEventSource::connect(&path)
            .unwrap()
            .with_reconnect_delay(Duration::from_millis(10));
        let stop = source.stop_handle();
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::spawn(move || source.run(tx));

        // The same event arrives once per connection.
        for _ in 0..2 {
            let input = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(input, Input::Compositor(CompositorEvent::WindowClosed(4)));
        }

        stop.stop();
        handle.join().unwrap().unwrap();

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn connect_fails_without_compositor() {
        assert!(NiriEventSource::connect(tmp_socket_path("absent")).is_err());
    }
}
