use serde::{Deserialize, Serialize};

/// Messages from daemon to clients (JSON-lines over Unix socket).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonMsg {
    /// The click layer was switched on or off. Sent to subscribers only.
    #[serde(rename = "layer_changed")]
    LayerChanged { layer: u8, active: bool },
    /// Status response.
    #[serde(rename = "status")]
    Status {
        enabled: bool,
        /// Activation state: "idle", "armed", "active" or "clicking".
        state: String,
        layer: u8,
        active: bool,
        version: String,
    },
    /// Acknowledgement for commands.
    #[serde(rename = "ack")]
    Ack { ok: bool, message: String },
}

/// Messages from clients to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Client wants `LayerChanged` notifications on this connection.
    #[serde(rename = "subscribe")]
    Subscribe,
    /// Request current status.
    #[serde(rename = "get_status")]
    GetStatus,
    /// Request to enable automatic activation.
    #[serde(rename = "enable")]
    Enable,
    /// Request to disable automatic activation.
    #[serde(rename = "disable")]
    Disable,
    /// Request to toggle enabled state.
    #[serde(rename = "toggle")]
    Toggle,
}

/// Serialize a message as a JSON line (with trailing newline).
pub fn encode(msg: &impl Serialize) -> String {
    let mut s = serde_json::to_string(msg).expect("serialize IPC message");
    s.push('\n');
    s
}

/// Deserialize a JSON line. Returns None on empty/whitespace input.
pub fn decode_daemon(line: &str) -> Option<DaemonMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

pub fn decode_client(line: &str) -> Option<ClientMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
