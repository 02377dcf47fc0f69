//! Inbound Control Bridge
//!
//! Single type-tagged dispatcher for the control messages the orchestrator
//! accepts, plus a JSON-lines server that feeds it from any byte stream.
//!
//! # Usage
//!
//! Clients write one JSON object per line:
//!
//! ```json
//! {
//!   "requestId": 7,
//!   "type": "SWITCH_SEMANTIC_MODEL",
//!   "modelPreset": "multilingual-e5-base",
//!   "modelVersion": "quantized",
//!   "modelDimension": 768,
//!   "previousDimension": 384
//! }
//! ```
//!
//! and receive one reply line per request, `{"requestId": 7, "success": true}`.
//! Replies are written as each request completes, so a slow model switch does
//! not hold back a status query sent after it. Clients that pipeline requests
//! should set `requestId` to match replies.

pub mod handlers;
pub mod server;
pub mod types;

pub use handlers::{dispatch, handle_line};
pub use server::{run_bridge_server, run_bridge_stdio};
pub use types::{BridgeResponse, ControlMessage};
