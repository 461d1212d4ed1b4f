//! Signaling wire protocol
//!
//! Every frame is a JSON object with a `type` discriminator:
//!
//! ```text
//! client -> server   {"type":"login","name":"Alice"}                 first frame
//! server -> client   {"type":"login","success":true}
//! server -> all      {"type":"user_list","users":["Alice","Bob"]}   after join/leave
//! client -> server   {"type":"offer","name":"Alice","target":"Bob",...}
//! server -> Bob      (same text, forwarded verbatim)
//! server -> client   {"type":"error","message":"..."}
//! ```
//!
//! Only `type`, `name` and `target` are ever inspected; everything else in a
//! routed message is opaque.

pub mod message;

pub use message::{parse, ClientMessage, ProtocolError, RoutedMessage, ServerMessage};

/// `type` value of the login handshake
pub const TYPE_LOGIN: &str = "login";

/// `type` value of presence broadcasts
pub const TYPE_USER_LIST: &str = "user_list";
