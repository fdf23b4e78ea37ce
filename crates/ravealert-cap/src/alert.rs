//! CAP v1.2 alert structures and code-value enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default namespace of every CAP v1.2 document.
pub const CAP_NAMESPACE: &str = "urn:oasis:names:tc:emergency:cap:1.2";

/// Wire format of the `sent` timestamp. CAP fixes the offset to `+00:00`,
/// which chrono's `%z` cannot emit, so the offset is part of the literal.
pub const SENT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// A CAP code value that did not match any declared enum member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {field} value: {value:?}")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

impl UnknownValue {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Top-level CAP alert message.
///
/// The graph is read-only once constructed: either the parser built it from
/// inbound wire bytes or the builder assembled it for outbound delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier, also used as the storage filename
    pub identifier: String,
    /// Originating system, typically a hostname
    pub sender: String,
    /// Time the alert was issued
    pub sent: DateTime<Utc>,
    pub status: Status,
    pub msg_type: MsgType,
    pub scope: Scope,
    pub source: Option<String>,
    pub restriction: Option<String>,
    pub addresses: Option<String>,
    /// Listener-side routing codes, order preserved
    pub code: Option<Vec<String>>,
    pub note: Option<String>,
    pub references: Option<String>,
    pub incidents: Option<String>,
    /// Language-specific content blocks
    pub info: Vec<Info>,
}

/// Language/category-specific content section of an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub language: String,
    pub category: Vec<Category>,
    pub event: String,
    pub response_type: Option<Vec<ResponseType>>,
    pub urgency: Urgency,
    pub severity: Severity,
    pub certainty: Certainty,
    pub audience: Option<String>,
    pub event_code: Vec<EventCode>,
    // effective/onset/expires carry arbitrary +-HH:MM offsets that a fixed
    // UTC timestamp cannot represent, so the wire text is kept verbatim.
    pub effective: Option<String>,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub sender_name: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub web: Option<String>,
    pub contact: Option<String>,
    pub parameter: Option<Vec<Parameter>>,
    pub resource: Option<Vec<Resource>>,
    pub area: Option<Vec<Area>>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            category: Vec::new(),
            event: String::new(),
            response_type: None,
            urgency: Urgency::Unknown,
            severity: Severity::Unknown,
            certainty: Certainty::Unknown,
            audience: None,
            event_code: Vec::new(),
            effective: None,
            onset: None,
            expires: None,
            sender_name: None,
            headline: None,
            description: None,
            instruction: None,
            web: None,
            contact: None,
            parameter: None,
            resource: None,
            area: None,
        }
    }
}

/// Geographic targeting section of an info block.
///
/// Polygon and circle geometry is opaque text per the CAP schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub area_desc: String,
    pub polygon: Option<Vec<String>>,
    pub circle: Option<Vec<String>>,
    pub geocode: Option<Vec<GeoCode>>,
    pub altitude: Option<f64>,
    pub ceiling: Option<f64>,
}

impl Area {
    pub fn new(area_desc: impl Into<String>) -> Self {
        Self {
            area_desc: area_desc.into(),
            polygon: None,
            circle: None,
            geocode: None,
            altitude: None,
            ceiling: None,
        }
    }
}

/// `(valueName, value)` pair inside an `<area>` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCode {
    pub value_name: String,
    pub value: String,
}

/// `(valueName, value)` pair inside `<eventCode>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCode {
    pub value_name: String,
    pub value: String,
}

/// `(valueName, value)` pair inside `<parameter>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub value_name: String,
    pub value: String,
}

/// Additional file attached to an info block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_desc: String,
    pub mime_type: String,
    pub size: Option<i64>,
    pub uri: Option<String>,
    pub deref_uri: Option<String>,
    pub digest: Option<String>,
}

/// Handling code of the alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Actual,
    Exercise,
    System,
    Test,
    Draft,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Actual => "Actual",
            Status::Exercise => "Exercise",
            Status::System => "System",
            Status::Test => "Test",
            Status::Draft => "Draft",
        }
    }
}

impl FromStr for Status {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Actual" => Ok(Status::Actual),
            "Exercise" => Ok(Status::Exercise),
            "System" => Ok(Status::System),
            "Test" => Ok(Status::Test),
            "Draft" => Ok(Status::Draft),
            other => Err(UnknownValue::new("status", other)),
        }
    }
}

/// Nature of the alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    Alert,
    Update,
    Cancel,
    Ack,
    Error,
}

impl MsgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MsgType::Alert => "Alert",
            MsgType::Update => "Update",
            MsgType::Cancel => "Cancel",
            MsgType::Ack => "Ack",
            MsgType::Error => "Error",
        }
    }
}

impl FromStr for MsgType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Alert" => Ok(MsgType::Alert),
            "Update" => Ok(MsgType::Update),
            "Cancel" => Ok(MsgType::Cancel),
            "Ack" => Ok(MsgType::Ack),
            "Error" => Ok(MsgType::Error),
            other => Err(UnknownValue::new("msgType", other)),
        }
    }
}

/// Intended distribution of the alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Public,
    Restricted,
    Private,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Public => "Public",
            Scope::Restricted => "Restricted",
            Scope::Private => "Private",
        }
    }
}

impl FromStr for Scope {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Public" => Ok(Scope::Public),
            "Restricted" => Ok(Scope::Restricted),
            "Private" => Ok(Scope::Private),
            other => Err(UnknownValue::new("scope", other)),
        }
    }
}

/// Subject category of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Geo,
    Met,
    Safety,
    Security,
    Rescue,
    Fire,
    Health,
    Env,
    Transport,
    Infra,
    Cbrne,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Geo => "Geo",
            Category::Met => "Met",
            Category::Safety => "Safety",
            Category::Security => "Security",
            Category::Rescue => "Rescue",
            Category::Fire => "Fire",
            Category::Health => "Health",
            Category::Env => "Env",
            Category::Transport => "Transport",
            Category::Infra => "Infra",
            Category::Cbrne => "CBRNE",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Geo" => Ok(Category::Geo),
            "Met" => Ok(Category::Met),
            "Safety" => Ok(Category::Safety),
            "Security" => Ok(Category::Security),
            "Rescue" => Ok(Category::Rescue),
            "Fire" => Ok(Category::Fire),
            "Health" => Ok(Category::Health),
            "Env" => Ok(Category::Env),
            "Transport" => Ok(Category::Transport),
            "Infra" => Ok(Category::Infra),
            "CBRNE" => Ok(Category::Cbrne),
            "Other" => Ok(Category::Other),
            other => Err(UnknownValue::new("category", other)),
        }
    }
}

/// Recommended action for the intended audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseType {
    Shelter,
    Evacuate,
    Prepare,
    Execute,
    Avoid,
    Monitor,
    Assess,
    AllClear,
    None,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Shelter => "Shelter",
            ResponseType::Evacuate => "Evacuate",
            ResponseType::Prepare => "Prepare",
            ResponseType::Execute => "Execute",
            ResponseType::Avoid => "Avoid",
            ResponseType::Monitor => "Monitor",
            ResponseType::Assess => "Assess",
            ResponseType::AllClear => "AllClear",
            ResponseType::None => "None",
        }
    }
}

impl FromStr for ResponseType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Shelter" => Ok(ResponseType::Shelter),
            "Evacuate" => Ok(ResponseType::Evacuate),
            "Prepare" => Ok(ResponseType::Prepare),
            "Execute" => Ok(ResponseType::Execute),
            "Avoid" => Ok(ResponseType::Avoid),
            "Monitor" => Ok(ResponseType::Monitor),
            "Assess" => Ok(ResponseType::Assess),
            "AllClear" => Ok(ResponseType::AllClear),
            "None" => Ok(ResponseType::None),
            other => Err(UnknownValue::new("responseType", other)),
        }
    }
}

/// Time available for preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Immediate,
    Expected,
    Future,
    Past,
    Unknown,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Immediate => "Immediate",
            Urgency::Expected => "Expected",
            Urgency::Future => "Future",
            Urgency::Past => "Past",
            Urgency::Unknown => "Unknown",
        }
    }
}

impl FromStr for Urgency {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Immediate" => Ok(Urgency::Immediate),
            "Expected" => Ok(Urgency::Expected),
            "Future" => Ok(Urgency::Future),
            "Past" => Ok(Urgency::Past),
            "Unknown" => Ok(Urgency::Unknown),
            other => Err(UnknownValue::new("urgency", other)),
        }
    }
}

/// Severity of the event's impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Extreme => "Extreme",
            Severity::Severe => "Severe",
            Severity::Moderate => "Moderate",
            Severity::Minor => "Minor",
            Severity::Unknown => "Unknown",
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Extreme" => Ok(Severity::Extreme),
            "Severe" => Ok(Severity::Severe),
            "Moderate" => Ok(Severity::Moderate),
            "Minor" => Ok(Severity::Minor),
            "Unknown" => Ok(Severity::Unknown),
            other => Err(UnknownValue::new("severity", other)),
        }
    }
}

/// Confidence in the observation or prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Certainty {
    Observed,
    Likely,
    Possible,
    Unlikely,
    Unknown,
}

impl Certainty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Certainty::Observed => "Observed",
            Certainty::Likely => "Likely",
            Certainty::Possible => "Possible",
            Certainty::Unlikely => "Unlikely",
            Certainty::Unknown => "Unknown",
        }
    }
}

impl FromStr for Certainty {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Observed" => Ok(Certainty::Observed),
            "Likely" => Ok(Certainty::Likely),
            "Possible" => Ok(Certainty::Possible),
            "Unlikely" => Ok(Certainty::Unlikely),
            "Unknown" => Ok(Certainty::Unknown),
            other => Err(UnknownValue::new("certainty", other)),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Status, MsgType, Scope, Category, ResponseType, Urgency, Severity, Certainty);

impl Alert {
    /// The `sent` timestamp in its fixed wire form.
    pub fn sent_text(&self) -> String {
        self.sent.format(SENT_FORMAT).to_string()
    }

    /// First info block, if any. The content-policy validator and most
    /// delivery targets only look at this one.
    pub fn first_info(&self) -> Option<&Info> {
        self.info.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_enum_round_trip() {
        for s in ["Actual", "Exercise", "System", "Test", "Draft"] {
            assert_eq!(s.parse::<Status>().unwrap().as_str(), s);
        }
        for s in ["Geo", "CBRNE", "Other"] {
            assert_eq!(s.parse::<Category>().unwrap().as_str(), s);
        }
        assert_eq!("AllClear".parse::<ResponseType>().unwrap(), ResponseType::AllClear);
    }

    #[test]
    fn test_enum_rejects_unknown() {
        let err = "Panic".parse::<Urgency>().unwrap_err();
        assert_eq!(err.field, "urgency");
        assert_eq!(err.value, "Panic");
        assert!("geo".parse::<Category>().is_err());
        assert!("".parse::<Scope>().is_err());
    }

    #[test]
    fn test_info_defaults() {
        let info = Info::default();
        assert_eq!(info.language, "en-US");
        assert_eq!(info.urgency, Urgency::Unknown);
        assert_eq!(info.severity, Severity::Unknown);
        assert_eq!(info.certainty, Certainty::Unknown);
        assert!(info.category.is_empty());
    }

    #[test]
    fn test_sent_text_fixed_offset() {
        let alert = Alert {
            identifier: "a".to_string(),
            sender: "host".to_string(),
            sent: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            status: Status::Test,
            msg_type: MsgType::Alert,
            scope: Scope::Private,
            source: None,
            restriction: None,
            addresses: None,
            code: None,
            note: None,
            references: None,
            incidents: None,
            info: Vec::new(),
        };
        assert_eq!(alert.sent_text(), "2024-03-01T12:30:05+00:00");
    }
}
