//! Outbound side of the RaveAlert CAP gateway: build a full alert from a
//! flat parameter set and deliver it to a remote inbound listener.

pub mod builder;
pub mod send;

pub use builder::{build_alert, BuildParams};
pub use send::{send_alert, send_with_config, SendError};
