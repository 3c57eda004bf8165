//! Sound-device hotplug watcher
//!
//! Subscribes to udev "sound" subsystem events on a dedicated thread and
//! forwards them over a channel; the event loop consumes them with
//! [`DeviceWatcher::next`]. The monitor socket is non-blocking, so the thread
//! polls it with a one-second timeout, which also lets it notice a dropped
//! receiver and exit.

use std::fmt;
use std::os::unix::io::AsRawFd;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::error;

const POLL_TIMEOUT_MS: i32 = 1000;

/// What happened to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    Added,
    Removed,
    Changed,
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceAction::Added => write!(f, "added"),
            DeviceAction::Removed => write!(f, "removed"),
            DeviceAction::Changed => write!(f, "changed"),
        }
    }
}

/// One hotplug notification with a human-readable device label
#[derive(Debug, Clone)]
pub struct DeviceEvent {
    pub action: DeviceAction,
    pub label: String,
}

/// Hotplug event source backed by a udev monitor thread
pub struct DeviceWatcher {
    rx: mpsc::Receiver<DeviceEvent>,
}

impl DeviceWatcher {
    /// Open the udev monitor and spawn the forwarding thread
    pub fn new() -> Result<Self> {
        let socket = udev::MonitorBuilder::new()
            .context("failed to create udev monitor")?
            .match_subsystem("sound")
            .context("failed to filter udev monitor to the sound subsystem")?
            .listen()
            .context("failed to listen on udev monitor socket")?;

        let (tx, rx) = mpsc::channel(64);
        std::thread::Builder::new()
            .name("udev-monitor".to_string())
            .spawn(move || monitor_thread(socket, tx))
            .context("failed to spawn udev monitor thread")?;

        Ok(Self { rx })
    }

    /// Wait for the next device event; `None` once the monitor thread is gone
    pub async fn next(&mut self) -> Option<DeviceEvent> {
        self.rx.recv().await
    }

    /// Non-blocking drain, used to coalesce event bursts into one pass
    pub fn try_next(&mut self) -> Option<DeviceEvent> {
        self.rx.try_recv().ok()
    }
}

fn monitor_thread(socket: udev::MonitorSocket, tx: mpsc::Sender<DeviceEvent>) {
    let fd = socket.as_raw_fd();
    loop {
        let mut fds = [libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        }];
        let ready = unsafe { libc::poll(fds.as_mut_ptr(), 1, POLL_TIMEOUT_MS) };
        if ready < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            error!("udev poll failed: {err}");
            return;
        }
        if ready == 0 {
            if tx.is_closed() {
                return;
            }
            continue;
        }
        for event in socket.iter() {
            let action = match event.event_type() {
                udev::EventType::Add => DeviceAction::Added,
                udev::EventType::Remove => DeviceAction::Removed,
                udev::EventType::Change => DeviceAction::Changed,
                _ => continue,
            };
            let label = device_label(&event);
            if tx.blocking_send(DeviceEvent { action, label }).is_err() {
                // Receiver dropped, the daemon is shutting down.
                return;
            }
        }
    }
}

/// `ID_MODEL`, else `NAME`, else the kernel sysname
fn device_label(event: &udev::Event) -> String {
    event
        .property_value("ID_MODEL")
        .or_else(|| event.property_value("NAME"))
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_else(|| event.sysname().to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_render_like_udev_verbs() {
        assert_eq!(DeviceAction::Added.to_string(), "added");
        assert_eq!(DeviceAction::Removed.to_string(), "removed");
        assert_eq!(DeviceAction::Changed.to_string(), "changed");
    }
}
