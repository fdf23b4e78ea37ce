//! Strict XML decoder for CAP v1.2 alert messages

use crate::alert::{
    Alert, Area, EventCode, GeoCode, Info, Parameter, Resource, UnknownValue,
};
use chrono::{DateTime, Utc};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("message is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    #[error(transparent)]
    UnknownValue(#[from] UnknownValue),

    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid sent timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid document structure: {0}")]
    InvalidStructure(String),

    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(&'static str),
}

/// Parse a CAP alert from an XML string.
pub fn parse_alert(xml: &str) -> Result<Alert, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) if e.local_name().as_ref() == b"alert" => {
                return parse_alert_body(&mut reader);
            }
            XmlEvent::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                return Err(ParseError::InvalidStructure(format!(
                    "unexpected root element <{name}>"
                )));
            }
            XmlEvent::Eof => return Err(ParseError::MissingElement("alert")),
            _ => {}
        }
    }
}

/// Parse a CAP alert from raw wire bytes.
pub fn parse_alert_bytes(xml: &[u8]) -> Result<Alert, ParseError> {
    parse_alert(std::str::from_utf8(xml)?)
}

fn parse_alert_body(reader: &mut Reader<&[u8]>) -> Result<Alert, ParseError> {
    let mut identifier = None;
    let mut sender = None;
    let mut sent = None;
    let mut status = None;
    let mut msg_type = None;
    let mut scope = None;
    let mut source = None;
    let mut restriction = None;
    let mut addresses = None;
    let mut code = Vec::new();
    let mut note = None;
    let mut references = None;
    let mut incidents = None;
    let mut info = Vec::new();

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => match e.local_name().as_ref() {
                b"identifier" => identifier = Some(read_text(reader, "identifier")?),
                b"sender" => sender = Some(read_text(reader, "sender")?),
                b"sent" => sent = Some(parse_sent(&read_text(reader, "sent")?)?),
                b"status" => status = Some(read_text(reader, "status")?.parse()?),
                b"msgType" => msg_type = Some(read_text(reader, "msgType")?.parse()?),
                b"scope" => scope = Some(read_text(reader, "scope")?.parse()?),
                b"source" => source = Some(read_text(reader, "source")?),
                b"restriction" => restriction = Some(read_text(reader, "restriction")?),
                b"addresses" => addresses = Some(read_text(reader, "addresses")?),
                b"code" => code.push(read_text(reader, "code")?),
                b"note" => note = Some(read_text(reader, "note")?),
                b"references" => references = Some(read_text(reader, "references")?),
                b"incidents" => incidents = Some(read_text(reader, "incidents")?),
                b"info" => info.push(parse_info_body(reader)?),
                _ => skip_element(reader, &e)?,
            },
            XmlEvent::End(e) if e.local_name().as_ref() == b"alert" => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof("alert")),
            _ => {}
        }
    }

    Ok(Alert {
        identifier: identifier.ok_or(ParseError::MissingElement("identifier"))?,
        sender: sender.ok_or(ParseError::MissingElement("sender"))?,
        sent: sent.ok_or(ParseError::MissingElement("sent"))?,
        status: status.ok_or(ParseError::MissingElement("status"))?,
        msg_type: msg_type.ok_or(ParseError::MissingElement("msgType"))?,
        scope: scope.ok_or(ParseError::MissingElement("scope"))?,
        source,
        restriction,
        addresses,
        code: non_empty(code),
        note,
        references,
        incidents,
        info,
    })
}

fn parse_info_body(reader: &mut Reader<&[u8]>) -> Result<Info, ParseError> {
    let mut block = Info::default();
    let mut response_type = Vec::new();
    let mut parameter = Vec::new();
    let mut resource = Vec::new();
    let mut area = Vec::new();

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => match e.local_name().as_ref() {
                b"language" => block.language = read_text(reader, "language")?,
                b"category" => block.category.push(read_text(reader, "category")?.parse()?),
                b"event" => block.event = read_text(reader, "event")?,
                b"responseType" => {
                    response_type.push(read_text(reader, "responseType")?.parse()?)
                }
                b"urgency" => block.urgency = read_text(reader, "urgency")?.parse()?,
                b"severity" => block.severity = read_text(reader, "severity")?.parse()?,
                b"certainty" => block.certainty = read_text(reader, "certainty")?.parse()?,
                b"audience" => block.audience = Some(read_text(reader, "audience")?),
                b"eventCode" => {
                    let (value_name, value) =
                        parse_pair(reader, "eventCode", "eventCode valueName", "eventCode value")?;
                    block.event_code.push(EventCode { value_name, value });
                }
                b"effective" => block.effective = Some(read_text(reader, "effective")?),
                b"onset" => block.onset = Some(read_text(reader, "onset")?),
                b"expires" => block.expires = Some(read_text(reader, "expires")?),
                b"senderName" => block.sender_name = Some(read_text(reader, "senderName")?),
                b"headline" => block.headline = Some(read_text(reader, "headline")?),
                b"description" => block.description = Some(read_text(reader, "description")?),
                b"instruction" => block.instruction = Some(read_text(reader, "instruction")?),
                b"web" => block.web = Some(read_text(reader, "web")?),
                b"contact" => block.contact = Some(read_text(reader, "contact")?),
                b"parameter" => {
                    let (value_name, value) =
                        parse_pair(reader, "parameter", "parameter valueName", "parameter value")?;
                    parameter.push(Parameter { value_name, value });
                }
                b"resource" => resource.push(parse_resource_body(reader)?),
                b"area" => area.push(parse_area_body(reader)?),
                _ => skip_element(reader, &e)?,
            },
            XmlEvent::End(e) if e.local_name().as_ref() == b"info" => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof("info")),
            _ => {}
        }
    }

    block.response_type = non_empty(response_type);
    block.parameter = non_empty(parameter);
    block.resource = non_empty(resource);
    block.area = non_empty(area);
    Ok(block)
}

fn parse_area_body(reader: &mut Reader<&[u8]>) -> Result<Area, ParseError> {
    let mut area_desc = None;
    let mut polygon = Vec::new();
    let mut circle = Vec::new();
    let mut geocode = Vec::new();
    let mut altitude = None;
    let mut ceiling = None;

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => match e.local_name().as_ref() {
                b"areaDesc" => area_desc = Some(read_text(reader, "areaDesc")?),
                b"polygon" => polygon.push(read_text(reader, "polygon")?),
                b"circle" => circle.push(read_text(reader, "circle")?),
                b"geocode" => {
                    let (value_name, value) =
                        parse_pair(reader, "geocode", "geocode valueName", "geocode value")?;
                    geocode.push(GeoCode { value_name, value });
                }
                b"altitude" => {
                    altitude = Some(parse_number(&read_text(reader, "altitude")?, "altitude")?)
                }
                b"ceiling" => {
                    ceiling = Some(parse_number(&read_text(reader, "ceiling")?, "ceiling")?)
                }
                _ => skip_element(reader, &e)?,
            },
            XmlEvent::End(e) if e.local_name().as_ref() == b"area" => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof("area")),
            _ => {}
        }
    }

    Ok(Area {
        area_desc: area_desc.ok_or(ParseError::MissingElement("areaDesc"))?,
        polygon: non_empty(polygon),
        circle: non_empty(circle),
        geocode: non_empty(geocode),
        altitude,
        ceiling,
    })
}

fn parse_resource_body(reader: &mut Reader<&[u8]>) -> Result<Resource, ParseError> {
    let mut resource_desc = None;
    let mut mime_type = None;
    let mut size = None;
    let mut uri = None;
    let mut deref_uri = None;
    let mut digest = None;

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => match e.local_name().as_ref() {
                b"resourceDesc" => resource_desc = Some(read_text(reader, "resourceDesc")?),
                b"mimeType" => mime_type = Some(read_text(reader, "mimeType")?),
                b"size" => {
                    let text = read_text(reader, "size")?;
                    size = Some(text.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
                        field: "size",
                        value: text,
                    })?);
                }
                b"uri" => uri = Some(read_text(reader, "uri")?),
                b"derefUri" => deref_uri = Some(read_text(reader, "derefUri")?),
                b"digest" => digest = Some(read_text(reader, "digest")?),
                _ => skip_element(reader, &e)?,
            },
            XmlEvent::End(e) if e.local_name().as_ref() == b"resource" => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof("resource")),
            _ => {}
        }
    }

    Ok(Resource {
        resource_desc: resource_desc.ok_or(ParseError::MissingElement("resourceDesc"))?,
        mime_type: mime_type.ok_or(ParseError::MissingElement("mimeType"))?,
        size,
        uri,
        deref_uri,
        digest,
    })
}

/// Reads the `<valueName>`/`<value>` children shared by geocode, eventCode
/// and parameter elements.
fn parse_pair(
    reader: &mut Reader<&[u8]>,
    container: &'static str,
    name_field: &'static str,
    value_field: &'static str,
) -> Result<(String, String), ParseError> {
    let mut value_name = None;
    let mut value = None;

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => match e.local_name().as_ref() {
                b"valueName" => value_name = Some(read_text(reader, "valueName")?),
                b"value" => value = Some(read_text(reader, "value")?),
                _ => skip_element(reader, &e)?,
            },
            XmlEvent::End(e) if e.local_name().as_ref() == container.as_bytes() => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof(container)),
            _ => {}
        }
    }

    Ok((
        value_name.ok_or(ParseError::MissingElement(name_field))?,
        value.ok_or(ParseError::MissingElement(value_field))?,
    ))
}

/// Collects the text content of the current element up to its end tag.
fn read_text(reader: &mut Reader<&[u8]>, element: &'static str) -> Result<String, ParseError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            XmlEvent::Text(t) => text.push_str(&t.unescape()?),
            XmlEvent::CData(t) => text.push_str(std::str::from_utf8(t.as_ref())?),
            XmlEvent::Start(e) => {
                let child = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                return Err(ParseError::InvalidStructure(format!(
                    "unexpected child <{child}> inside <{element}>"
                )));
            }
            XmlEvent::End(_) => return Ok(text),
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof(element)),
            _ => {}
        }
    }
}

fn skip_element(
    reader: &mut Reader<&[u8]>,
    start: &quick_xml::events::BytesStart,
) -> Result<(), ParseError> {
    reader.read_to_end(start.name())?;
    Ok(())
}

fn parse_sent(text: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ParseError::InvalidTimestamp(text.to_string()))
}

fn parse_number(text: &str, field: &'static str) -> Result<f64, ParseError> {
    text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{Category, MsgType, Scope, Severity, Status, Urgency};

    const EXAMPLE_CAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <identifier>host-1695000000.123456-abcde</identifier>
  <sender>host</sender>
  <sent>2023-09-18T02:00:00+00:00</sent>
  <status>Actual</status>
  <msgType>Alert</msgType>
  <scope>Public</scope>
  <code>IPAWSv1.0</code>
  <info>
    <language>en-CA</language>
    <category>Geo</category>
    <event>Earthquake</event>
    <responseType>Monitor</responseType>
    <urgency>Immediate</urgency>
    <severity>Severe</severity>
    <certainty>Observed</certainty>
    <expires>2023-09-18T03:00:00-05:00</expires>
    <headline>Strong shaking reported</headline>
    <description>Felt reports received---Rapports de secousses re&#231;us</description>
    <parameter>
      <valueName>magnitude</valueName>
      <value>5.1</value>
    </parameter>
    <area>
      <areaDesc>Vancouver Island</areaDesc>
      <circle>49.3,-123.1 50</circle>
      <geocode>
        <valueName>profile:CAP-CP:Location:0.3</valueName>
        <value>5917</value>
      </geocode>
      <altitude>0</altitude>
    </area>
  </info>
</alert>"#;

    #[test]
    fn test_parse_full_alert() {
        let alert = parse_alert(EXAMPLE_CAP).expect("failed to parse CAP");

        assert_eq!(alert.identifier, "host-1695000000.123456-abcde");
        assert_eq!(alert.status, Status::Actual);
        assert_eq!(alert.msg_type, MsgType::Alert);
        assert_eq!(alert.scope, Scope::Public);
        assert_eq!(alert.sent_text(), "2023-09-18T02:00:00+00:00");
        assert_eq!(alert.code.as_deref(), Some(&["IPAWSv1.0".to_string()][..]));

        let info = alert.first_info().expect("info block");
        assert_eq!(info.language, "en-CA");
        assert_eq!(info.category, vec![Category::Geo]);
        assert_eq!(info.event, "Earthquake");
        assert_eq!(info.urgency, Urgency::Immediate);
        assert_eq!(info.severity, Severity::Severe);
        assert_eq!(info.expires.as_deref(), Some("2023-09-18T03:00:00-05:00"));

        let params = info.parameter.as_ref().expect("parameters");
        assert_eq!(params[0].value_name, "magnitude");
        assert_eq!(params[0].value, "5.1");

        let areas = info.area.as_ref().expect("areas");
        assert_eq!(areas[0].area_desc, "Vancouver Island");
        assert_eq!(areas[0].circle.as_deref(), Some(&["49.3,-123.1 50".to_string()][..]));
        assert_eq!(areas[0].altitude, Some(0.0));
        assert_eq!(areas[0].ceiling, None);
    }

    #[test]
    fn test_parse_defaults_missing_optionals() {
        let minimal = r#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <identifier>x</identifier>
  <sender>host</sender>
  <sent>2023-09-18T02:00:00+00:00</sent>
  <status>Test</status>
  <msgType>Alert</msgType>
  <scope>Private</scope>
  <info>
    <event>Ping</event>
  </info>
</alert>"#;

        let alert = parse_alert(minimal).expect("failed to parse minimal CAP");
        assert!(alert.code.is_none());
        let info = &alert.info[0];
        assert_eq!(info.language, "en-US");
        assert_eq!(info.urgency, Urgency::Unknown);
        assert!(info.response_type.is_none());
        assert!(info.parameter.is_none());
        assert!(info.area.is_none());
    }

    #[test]
    fn test_parse_missing_required_field() {
        let missing_sender = r#"<alert>
  <identifier>x</identifier>
  <sent>2023-09-18T02:00:00+00:00</sent>
  <status>Test</status>
  <msgType>Alert</msgType>
  <scope>Private</scope>
</alert>"#;
        assert!(matches!(
            parse_alert(missing_sender),
            Err(ParseError::MissingElement("sender"))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_enum_value() {
        let bad_status = r#"<alert>
  <identifier>x</identifier>
  <sender>host</sender>
  <sent>2023-09-18T02:00:00+00:00</sent>
  <status>Urgent</status>
  <msgType>Alert</msgType>
  <scope>Private</scope>
</alert>"#;
        assert!(matches!(
            parse_alert(bad_status),
            Err(ParseError::UnknownValue(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() {
        let bad_sent = r#"<alert>
  <identifier>x</identifier>
  <sender>host</sender>
  <sent>yesterday</sent>
  <status>Test</status>
  <msgType>Alert</msgType>
  <scope>Private</scope>
</alert>"#;
        assert!(matches!(
            parse_alert(bad_sent),
            Err(ParseError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        assert!(parse_alert("<alert><identifier>x</alert>").is_err());
        assert!(parse_alert("not xml at all").is_err());
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        assert!(matches!(
            parse_alert_bytes(&[0xff, 0xfe, 0x00]),
            Err(ParseError::Utf8(_))
        ));
    }

    #[test]
    fn test_parse_multiple_info_blocks_ordered() {
        let two = r#"<alert>
  <identifier>x</identifier>
  <sender>host</sender>
  <sent>2023-09-18T02:00:00+00:00</sent>
  <status>Test</status>
  <msgType>Alert</msgType>
  <scope>Private</scope>
  <info><language>en-CA</language><event>first</event></info>
  <info><language>fr-CA</language><event>second</event></info>
</alert>"#;
        let alert = parse_alert(two).expect("failed to parse");
        assert_eq!(alert.info.len(), 2);
        assert_eq!(alert.info[0].event, "first");
        assert_eq!(alert.info[1].language, "fr-CA");
    }
}
