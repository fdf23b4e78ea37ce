//! Simplified alert construction for flat-parameter callers.
//!
//! Legacy senders supply a handful of text fields rather than the full CAP
//! entity graph. [`build_alert`] expands those into a complete alert with
//! exactly one info block, a generated identifier, and the local hostname as
//! sender. Only new-alert creation is supported; updates and cancellations
//! need the full model.

use chrono::{DateTime, Utc};
use rand::Rng;
use ravealert_cap::{
    Alert, Area, Category, Certainty, EventCode, GeoCode, Info, MsgType, Parameter, ResponseType,
    Scope, Severity, Status, Urgency,
};

/// Flat parameter set accepted by the builder. Defaults match the mobile
/// quick-messaging profile of the upstream listener.
#[derive(Debug, Clone)]
pub struct BuildParams {
    pub status: Status,
    pub scope: Scope,
    pub code: Vec<String>,
    pub incidents: Option<String>,
    /// Explicit identifier; generated from host, time, and a random suffix
    /// when absent
    pub identifier: Option<String>,
    pub language: String,
    pub event: String,
    pub category: Vec<Category>,
    pub response_type: Vec<ResponseType>,
    pub urgency: Urgency,
    pub certainty: Certainty,
    pub severity: Severity,
    pub event_code: Vec<EventCode>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub web: Option<String>,
    pub contact: Option<String>,
    pub parameter: Vec<Parameter>,
    /// A single area is attached only when a description is supplied
    pub area_desc: Option<String>,
    pub geocode: Vec<GeoCode>,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            status: Status::Test,
            scope: Scope::Private,
            code: Vec::new(),
            incidents: None,
            identifier: None,
            language: "en-CA".to_string(),
            event: "CHIS Rave Alert Mobile message".to_string(),
            category: vec![Category::Geo],
            response_type: vec![ResponseType::None],
            urgency: Urgency::Immediate,
            certainty: Certainty::Observed,
            severity: Severity::Severe,
            event_code: Vec::new(),
            headline: None,
            description: None,
            instruction: None,
            web: None,
            contact: None,
            parameter: Vec::new(),
            area_desc: None,
            geocode: Vec::new(),
        }
    }
}

/// Builds a complete single-info alert from flat parameters.
///
/// `msgType` is always `Alert`, `sender` is the local hostname, and `sent`
/// is the current UTC time. Storage is never touched.
pub fn build_alert(params: BuildParams) -> Alert {
    let host = local_hostname();
    let now = Utc::now();

    let identifier = params
        .identifier
        .unwrap_or_else(|| generate_identifier(&host, now));

    let area = params.area_desc.map(|area_desc| {
        vec![Area {
            geocode: non_empty(params.geocode),
            ..Area::new(area_desc)
        }]
    });

    Alert {
        identifier,
        sender: host,
        sent: now,
        status: params.status,
        msg_type: MsgType::Alert,
        scope: params.scope,
        source: None,
        restriction: None,
        addresses: None,
        code: non_empty(params.code),
        note: None,
        references: None,
        incidents: params.incidents,
        info: vec![Info {
            language: params.language,
            category: params.category,
            event: params.event,
            response_type: non_empty(params.response_type),
            urgency: params.urgency,
            severity: params.severity,
            certainty: params.certainty,
            event_code: params.event_code,
            headline: params.headline,
            description: params.description,
            instruction: params.instruction,
            web: params.web,
            contact: params.contact,
            parameter: non_empty(params.parameter),
            area,
            ..Info::default()
        }],
    }
}

/// `{host}-{unix_secs}.{micros}-{5 random lowercase letters}`, collision-safe
/// across concurrent builders on one host without coordination.
fn generate_identifier(host: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect();

    format!(
        "{host}-{}.{:06}-{suffix}",
        now.timestamp(),
        now.timestamp_subsec_micros()
    )
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
