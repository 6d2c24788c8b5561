/*
[INPUT]:  Stage completions and failures reported by the session driver
[OUTPUT]: Linear lifecycle states of one streaming session
[POS]:    Session layer - lifecycle model
[UPDATE]: When adding or reordering session stages
*/

use crate::error::Stage;

/// Lifecycle of a single session. Progress is strictly forward; the only
/// repeat is `Receiving`, which re-arms after every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Resolving,
    Connecting,
    TlsHandshaking,
    WsHandshaking,
    Subscribing,
    Receiving,
    Failed(Stage),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Failed(_))
    }
}
