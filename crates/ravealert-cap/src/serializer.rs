//! XML serialization for CAP alert messages

use crate::alert::{Alert, Area, Info, Resource, CAP_NAMESPACE};
use quick_xml::escape::escape;
use std::fmt::Write;

/// Serialize an Alert to a pretty-printed CAP v1.2 XML document.
///
/// The root element declares the CAP namespace as the default namespace with
/// no prefix, and `sent` is rendered with the fixed `+00:00` offset.
pub fn serialize_alert(alert: &Alert) -> String {
    let mut xml = String::new();

    writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#).unwrap();
    writeln!(xml, r#"<alert xmlns="{CAP_NAMESPACE}">"#).unwrap();

    text_element(&mut xml, 1, "identifier", &alert.identifier);
    text_element(&mut xml, 1, "sender", &alert.sender);
    text_element(&mut xml, 1, "sent", &alert.sent_text());
    text_element(&mut xml, 1, "status", alert.status.as_str());
    text_element(&mut xml, 1, "msgType", alert.msg_type.as_str());
    text_element(&mut xml, 1, "scope", alert.scope.as_str());
    opt_element(&mut xml, 1, "source", alert.source.as_deref());
    opt_element(&mut xml, 1, "restriction", alert.restriction.as_deref());
    opt_element(&mut xml, 1, "addresses", alert.addresses.as_deref());
    for code in alert.code.iter().flatten() {
        text_element(&mut xml, 1, "code", code);
    }
    opt_element(&mut xml, 1, "note", alert.note.as_deref());
    opt_element(&mut xml, 1, "references", alert.references.as_deref());
    opt_element(&mut xml, 1, "incidents", alert.incidents.as_deref());
    for info in &alert.info {
        serialize_info(&mut xml, info);
    }

    writeln!(xml, "</alert>").unwrap();
    xml
}

fn serialize_info(xml: &mut String, info: &Info) {
    open_element(xml, 1, "info");

    text_element(xml, 2, "language", &info.language);
    for category in &info.category {
        text_element(xml, 2, "category", category.as_str());
    }
    text_element(xml, 2, "event", &info.event);
    for response_type in info.response_type.iter().flatten() {
        text_element(xml, 2, "responseType", response_type.as_str());
    }
    text_element(xml, 2, "urgency", info.urgency.as_str());
    text_element(xml, 2, "severity", info.severity.as_str());
    text_element(xml, 2, "certainty", info.certainty.as_str());
    opt_element(xml, 2, "audience", info.audience.as_deref());
    for event_code in &info.event_code {
        pair_element(xml, 2, "eventCode", &event_code.value_name, &event_code.value);
    }
    opt_element(xml, 2, "effective", info.effective.as_deref());
    opt_element(xml, 2, "onset", info.onset.as_deref());
    opt_element(xml, 2, "expires", info.expires.as_deref());
    opt_element(xml, 2, "senderName", info.sender_name.as_deref());
    opt_element(xml, 2, "headline", info.headline.as_deref());
    opt_element(xml, 2, "description", info.description.as_deref());
    opt_element(xml, 2, "instruction", info.instruction.as_deref());
    opt_element(xml, 2, "web", info.web.as_deref());
    opt_element(xml, 2, "contact", info.contact.as_deref());
    for parameter in info.parameter.iter().flatten() {
        pair_element(xml, 2, "parameter", &parameter.value_name, &parameter.value);
    }
    for resource in info.resource.iter().flatten() {
        serialize_resource(xml, resource);
    }
    for area in info.area.iter().flatten() {
        serialize_area(xml, area);
    }

    close_element(xml, 1, "info");
}

fn serialize_area(xml: &mut String, area: &Area) {
    open_element(xml, 2, "area");

    text_element(xml, 3, "areaDesc", &area.area_desc);
    for polygon in area.polygon.iter().flatten() {
        text_element(xml, 3, "polygon", polygon);
    }
    for circle in area.circle.iter().flatten() {
        text_element(xml, 3, "circle", circle);
    }
    for geocode in area.geocode.iter().flatten() {
        pair_element(xml, 3, "geocode", &geocode.value_name, &geocode.value);
    }
    if let Some(altitude) = area.altitude {
        number_element(xml, 3, "altitude", altitude);
    }
    if let Some(ceiling) = area.ceiling {
        number_element(xml, 3, "ceiling", ceiling);
    }

    close_element(xml, 2, "area");
}

fn serialize_resource(xml: &mut String, resource: &Resource) {
    open_element(xml, 2, "resource");

    text_element(xml, 3, "resourceDesc", &resource.resource_desc);
    text_element(xml, 3, "mimeType", &resource.mime_type);
    if let Some(size) = resource.size {
        indent(xml, 3);
        writeln!(xml, "<size>{size}</size>").unwrap();
    }
    opt_element(xml, 3, "uri", resource.uri.as_deref());
    opt_element(xml, 3, "derefUri", resource.deref_uri.as_deref());
    opt_element(xml, 3, "digest", resource.digest.as_deref());

    close_element(xml, 2, "resource");
}

fn text_element(xml: &mut String, level: usize, name: &str, value: &str) {
    indent(xml, level);
    writeln!(xml, "<{name}>{}</{name}>", escape(value)).unwrap();
}

fn opt_element(xml: &mut String, level: usize, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        text_element(xml, level, name, value);
    }
}

// `{}` on f64 prints the shortest representation that parses back to the
// same value, which keeps the codec round-trip exact.
fn number_element(xml: &mut String, level: usize, name: &str, value: f64) {
    indent(xml, level);
    writeln!(xml, "<{name}>{value}</{name}>").unwrap();
}

fn pair_element(xml: &mut String, level: usize, name: &str, value_name: &str, value: &str) {
    open_element(xml, level, name);
    text_element(xml, level + 1, "valueName", value_name);
    text_element(xml, level + 1, "value", value);
    close_element(xml, level, name);
}

fn open_element(xml: &mut String, level: usize, name: &str) {
    indent(xml, level);
    writeln!(xml, "<{name}>").unwrap();
}

fn close_element(xml: &mut String, level: usize, name: &str) {
    indent(xml, level);
    writeln!(xml, "</{name}>").unwrap();
}

fn indent(xml: &mut String, level: usize) {
    for _ in 0..level {
        xml.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{
        Alert, Info, MsgType, Parameter, Scope, Status, CAP_NAMESPACE,
    };
    use chrono::{TimeZone, Utc};

    fn minimal_alert() -> Alert {
        Alert {
            identifier: "test-1".to_string(),
            sender: "host".to_string(),
            sent: Utc.with_ymd_and_hms(2023, 9, 18, 2, 0, 0).unwrap(),
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
            info: vec![Info {
                event: "Ping".to_string(),
                ..Info::default()
            }],
        }
    }

    #[test]
    fn test_root_element_declares_namespace() {
        let xml = serialize_alert(&minimal_alert());
        assert!(xml.contains(r#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">"#));
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert_eq!(CAP_NAMESPACE, "urn:oasis:names:tc:emergency:cap:1.2");
    }

    #[test]
    fn test_sent_rendered_with_fixed_offset() {
        let xml = serialize_alert(&minimal_alert());
        assert!(xml.contains("<sent>2023-09-18T02:00:00+00:00</sent>"));
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let xml = serialize_alert(&minimal_alert());
        assert!(!xml.contains("<source>"));
        assert!(!xml.contains("<code>"));
        assert!(!xml.contains("<responseType>"));
        assert!(!xml.contains("<area>"));
    }

    #[test]
    fn test_text_content_is_escaped() {
        let mut alert = minimal_alert();
        alert.info[0].headline = Some("Flood <watch> & warning".to_string());
        let xml = serialize_alert(&alert);
        assert!(xml.contains("<headline>Flood &lt;watch&gt; &amp; warning</headline>"));
    }

    #[test]
    fn test_parameter_pair_layout() {
        let mut alert = minimal_alert();
        alert.info[0].parameter = Some(vec![Parameter {
            value_name: "layer".to_string(),
            value: "SOREM-1.0".to_string(),
        }]);
        let xml = serialize_alert(&alert);
        assert!(xml.contains("<parameter>\n      <valueName>layer</valueName>\n      <value>SOREM-1.0</value>\n    </parameter>"));
    }
}
