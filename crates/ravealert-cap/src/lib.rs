//! CAP (Common Alerting Protocol) v1.2 message model and wire codec
//!
//! This crate provides the alert entity graph, a strict XML codec, and the
//! content-policy validator applied before an inbound alert is accepted.
//!
//! # Features
//!
//! - Typed CAP v1.2 entity graph with closed code-value enums
//! - Lossless XML codec: `parse(serialize(alert)) == alert`
//! - Fixed `+00:00` rendering of the `sent` timestamp
//! - Bilingual description policy validation for inbound messages
//!
//! # Example
//!
//! ```rust
//! use ravealert_cap::parse_alert;
//!
//! let cap_xml = r#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
//!   <identifier>host-1695000000.000000-abcde</identifier>
//!   <sender>host</sender>
//!   <sent>2023-09-18T02:00:00+00:00</sent>
//!   <status>Test</status>
//!   <msgType>Alert</msgType>
//!   <scope>Private</scope>
//! </alert>"#;
//!
//! let alert = parse_alert(cap_xml).expect("failed to parse CAP");
//! assert_eq!(alert.identifier, "host-1695000000.000000-abcde");
//! ```

pub mod alert;
pub mod parser;
pub mod serializer;
pub mod validate;

pub use alert::{
    Alert, Area, Category, Certainty, EventCode, GeoCode, Info, MsgType, Parameter, Resource,
    ResponseType, Scope, Severity, Status, UnknownValue, Urgency, CAP_NAMESPACE,
};
pub use parser::{parse_alert, parse_alert_bytes, ParseError};
pub use serializer::serialize_alert;
pub use validate::{validate_alert, ValidationError};
