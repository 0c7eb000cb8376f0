//! SOCKS5 command parsing module
//!
//! Handles parsing SOCKS5 connection requests and building replies.

mod parser;
mod reply;

pub use parser::parse_request;
pub use reply::{encode_reply, send_reply};
