//! XML-RPC wire codec.
//!
//! Maps between `serde_json::Value` (the crate's dynamic value type) and the
//! XML-RPC `<methodCall>` / `<methodResponse>` documents Odoo speaks.
//! Scalars, arrays, structs and `<nil/>` are supported; `dateTime.iso8601`
//! and `base64` payloads decode to plain strings.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlRpcError {
    #[error("failed to encode XML-RPC request: {0}")]
    Encode(String),

    #[error("malformed XML-RPC response: {0}")]
    Malformed(String),

    /// A `<fault>` payload from the server.
    #[error("fault {code}: {message}")]
    Fault { code: i32, message: String },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize a `<methodCall>` document for `method` with positional `params`.
pub fn encode_request(method: &str, params: &[Value]) -> Result<String, XmlRpcError> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    writer
        .write_event(Event::Start(BytesStart::new("methodCall")))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    write_text_element(&mut writer, "methodName", method)?;
    writer
        .write_event(Event::Start(BytesStart::new("params")))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    for param in params {
        writer
            .write_event(Event::Start(BytesStart::new("param")))
            .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
        write_value(&mut writer, param)?;
        writer
            .write_event(Event::End(BytesEnd::new("param")))
            .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("params")))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    writer
        .write_event(Event::End(BytesEnd::new("methodCall")))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| XmlRpcError::Encode(format!("request was not valid UTF-8: {e}")))
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    tag: &str,
    text: &str,
) -> Result<(), XmlRpcError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    Ok(())
}

fn write_value(writer: &mut Writer<Vec<u8>>, value: &Value) -> Result<(), XmlRpcError> {
    writer
        .write_event(Event::Start(BytesStart::new("value")))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;

    match value {
        Value::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new("nil")))
                .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
        }
        Value::Bool(b) => {
            write_text_element(writer, "boolean", if *b { "1" } else { "0" })?;
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                write_text_element(writer, "int", &i.to_string())?;
            } else {
                // u64 beyond i64 range or a float; XML-RPC ints are 32-bit
                // anyway, so double is the honest encoding for both.
                let f = n.as_f64().unwrap_or(0.0);
                write_text_element(writer, "double", &f.to_string())?;
            }
        }
        Value::String(s) => {
            write_text_element(writer, "string", s)?;
        }
        Value::Array(items) => {
            writer
                .write_event(Event::Start(BytesStart::new("array")))
                .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
            writer
                .write_event(Event::Start(BytesStart::new("data")))
                .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
            for item in items {
                write_value(writer, item)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("data")))
                .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
            writer
                .write_event(Event::End(BytesEnd::new("array")))
                .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
        }
        Value::Object(fields) => {
            writer
                .write_event(Event::Start(BytesStart::new("struct")))
                .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
            for (name, member) in fields {
                writer
                    .write_event(Event::Start(BytesStart::new("member")))
                    .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
                write_text_element(writer, "name", name)?;
                write_value(writer, member)?;
                writer
                    .write_event(Event::End(BytesEnd::new("member")))
                    .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("struct")))
                .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("value")))
        .map_err(|e| XmlRpcError::Encode(e.to_string()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parse a `<methodResponse>` document into the single result value.
///
/// A `<fault>` payload is surfaced as [`XmlRpcError::Fault`].
pub fn decode_response(xml: &str) -> Result<Value, XmlRpcError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_fault = false;
    loop {
        match next_event(&mut reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"methodResponse" | b"params" | b"param" => {}
                b"fault" => in_fault = true,
                b"value" => {
                    let value = parse_value(&mut reader)?;
                    if in_fault {
                        return Err(fault_from_value(value));
                    }
                    return Ok(value);
                }
                other => {
                    return Err(XmlRpcError::Malformed(format!(
                        "unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )))
                }
            },
            Event::Decl(_) | Event::Text(_) | Event::End(_) => {}
            Event::Eof => {
                return Err(XmlRpcError::Malformed(
                    "response ended before any <value>".into(),
                ))
            }
            _ => {}
        }
    }
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, XmlRpcError> {
    reader
        .read_event()
        .map_err(|e| XmlRpcError::Malformed(e.to_string()))
}

/// Parse the contents of a `<value>` element; the opening tag has already
/// been consumed, and this consumes through the matching `</value>`.
fn parse_value(reader: &mut Reader<&[u8]>) -> Result<Value, XmlRpcError> {
    let mut parsed: Option<Value> = None;
    loop {
        match next_event(reader)? {
            Event::Start(e) => {
                let value = match e.name().as_ref() {
                    b"string" | b"dateTime.iso8601" | b"base64" => {
                        Value::String(read_scalar_text(reader, e.name().as_ref())?)
                    }
                    b"int" | b"i4" | b"i8" => {
                        let text = read_scalar_text(reader, e.name().as_ref())?;
                        let n = text.trim().parse::<i64>().map_err(|_| {
                            XmlRpcError::Malformed(format!("invalid integer {text:?}"))
                        })?;
                        Value::Number(Number::from(n))
                    }
                    b"boolean" => {
                        let text = read_scalar_text(reader, b"boolean")?;
                        Value::Bool(matches!(text.trim(), "1" | "true"))
                    }
                    b"double" => {
                        let text = read_scalar_text(reader, b"double")?;
                        let f = text.trim().parse::<f64>().map_err(|_| {
                            XmlRpcError::Malformed(format!("invalid double {text:?}"))
                        })?;
                        Number::from_f64(f)
                            .map(Value::Number)
                            .unwrap_or(Value::Null)
                    }
                    b"nil" => {
                        consume_end(reader, b"nil")?;
                        Value::Null
                    }
                    b"array" => parse_array(reader)?,
                    b"struct" => parse_struct(reader)?,
                    other => {
                        return Err(XmlRpcError::Malformed(format!(
                            "unexpected element <{}> inside <value>",
                            String::from_utf8_lossy(other)
                        )))
                    }
                };
                parsed = Some(value);
            }
            Event::Empty(e) => {
                let value = match e.name().as_ref() {
                    b"nil" => Value::Null,
                    b"string" | b"base64" => Value::String(String::new()),
                    other => {
                        return Err(XmlRpcError::Malformed(format!(
                            "unexpected empty element <{}/> inside <value>",
                            String::from_utf8_lossy(other)
                        )))
                    }
                };
                parsed = Some(value);
            }
            // An untyped <value>text</value> is a string in XML-RPC.
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| XmlRpcError::Malformed(e.to_string()))?;
                if parsed.is_none() {
                    parsed = Some(Value::String(text.into_owned()));
                }
            }
            Event::End(e) if e.name().as_ref() == b"value" => {
                return Ok(parsed.unwrap_or(Value::String(String::new())));
            }
            Event::Eof => {
                return Err(XmlRpcError::Malformed(
                    "response ended inside <value>".into(),
                ))
            }
            _ => {}
        }
    }
}

fn parse_array(reader: &mut Reader<&[u8]>) -> Result<Value, XmlRpcError> {
    let mut items = Vec::new();
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"data" => {}
                b"value" => items.push(parse_value(reader)?),
                other => {
                    return Err(XmlRpcError::Malformed(format!(
                        "unexpected element <{}> inside <array>",
                        String::from_utf8_lossy(other)
                    )))
                }
            },
            Event::End(e) if e.name().as_ref() == b"array" => return Ok(Value::Array(items)),
            Event::End(_) | Event::Text(_) => {}
            Event::Eof => {
                return Err(XmlRpcError::Malformed(
                    "response ended inside <array>".into(),
                ))
            }
            _ => {}
        }
    }
}

fn parse_struct(reader: &mut Reader<&[u8]>) -> Result<Value, XmlRpcError> {
    let mut fields = Map::new();
    let mut name: Option<String> = None;
    loop {
        match next_event(reader)? {
            Event::Start(e) => match e.name().as_ref() {
                b"member" => name = None,
                b"name" => name = Some(read_scalar_text(reader, b"name")?),
                b"value" => {
                    let member_name = name.take().ok_or_else(|| {
                        XmlRpcError::Malformed("struct member value without a name".into())
                    })?;
                    fields.insert(member_name, parse_value(reader)?);
                }
                other => {
                    return Err(XmlRpcError::Malformed(format!(
                        "unexpected element <{}> inside <struct>",
                        String::from_utf8_lossy(other)
                    )))
                }
            },
            Event::End(e) if e.name().as_ref() == b"struct" => return Ok(Value::Object(fields)),
            Event::End(_) | Event::Text(_) => {}
            Event::Eof => {
                return Err(XmlRpcError::Malformed(
                    "response ended inside <struct>".into(),
                ))
            }
            _ => {}
        }
    }
}

/// Read the text content of a scalar element and consume its end tag.
fn read_scalar_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<String, XmlRpcError> {
    let mut text = String::new();
    loop {
        match next_event(reader)? {
            Event::Text(t) => {
                text.push_str(
                    &t.unescape()
                        .map_err(|e| XmlRpcError::Malformed(e.to_string()))?,
                );
            }
            Event::End(e) if e.name().as_ref() == tag => return Ok(text),
            Event::Eof => {
                return Err(XmlRpcError::Malformed(format!(
                    "response ended inside <{}>",
                    String::from_utf8_lossy(tag)
                )))
            }
            other => {
                return Err(XmlRpcError::Malformed(format!(
                    "unexpected {:?} inside <{}>",
                    other,
                    String::from_utf8_lossy(tag)
                )))
            }
        }
    }
}

fn consume_end(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<(), XmlRpcError> {
    loop {
        match next_event(reader)? {
            Event::End(e) if e.name().as_ref() == tag => return Ok(()),
            Event::Text(_) => {}
            Event::Eof => {
                return Err(XmlRpcError::Malformed(format!(
                    "response ended inside <{}>",
                    String::from_utf8_lossy(tag)
                )))
            }
            other => {
                return Err(XmlRpcError::Malformed(format!(
                    "unexpected {:?} inside <{}>",
                    other,
                    String::from_utf8_lossy(tag)
                )))
            }
        }
    }
}

fn fault_from_value(value: Value) -> XmlRpcError {
    let code = value
        .get("faultCode")
        .and_then(Value::as_i64)
        .unwrap_or_default() as i32;
    let message = value
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or("unknown fault")
        .to_string();
    XmlRpcError::Fault { code, message }
}
