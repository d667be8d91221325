//! Error types for the protocol layer.
//!
//! Each crate in LiveHall defines its own error enum. A `ProtocolError`
//! always means "the bytes were well-formed JSON but the values break a
//! wire rule" (an unknown enum code, a judge list of the wrong length).

/// Errors that can occur while interpreting wire values.
///
/// These surface through serde's `try_from` hooks, so a bad request body
/// is rejected at decode time and never reaches the room layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// An integer code does not name any variant of the target enum.
    ///
    /// `kind` is the enum being decoded (e.g. `"LiveDifficulty"`).
    #[error("unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: u8 },

    /// The message is invalid at the protocol level.
    ///
    /// For logical errors that pass JSON parsing but violate protocol
    /// rules, e.g. a judge histogram with four buckets.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
