//! XML form of a protocol definition.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <device name="">
//!   <inputs>
//!     <command name="NAME">
//!       <param name="P" type="char" value="X"/>
//!       <param name="P" type="uint8" value="255"/>
//!       <param name="P" type="uint16" value="65535"/>
//!     </command>
//!   </inputs>
//! </device>
//! ```
//!
//! Saving always writes the layout above. Reading is looser: every
//! `<command>` is picked up in document order wherever it sits, together with
//! every `<param>` nested anywhere inside it. Every attribute is optional on
//! the way in so that a damaged entry can be reported and skipped instead of
//! failing the whole document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::se::Serializer;
use serde::Serialize;

/// Declaration written in front of every saved document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// `<device>` root element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename = "device")]
pub struct DeviceElement {
    #[serde(rename = "@name")]
    pub name: String,
    pub inputs: InputsElement,
}

/// `<inputs>` list of commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputsElement {
    #[serde(rename = "command")]
    pub commands: Vec<CommandElement>,
}

/// `<command>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandElement {
    #[serde(rename = "@name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "param")]
    pub params: Vec<ParamElement>,
}

/// `<param>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamElement {
    #[serde(rename = "@name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "@value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl DeviceElement {
    /// Parse a document.
    ///
    /// The whole input must be well-formed XML with exactly one root element;
    /// anything else is returned as an error message and nothing is kept.
    pub fn from_xml(xml: &str) -> Result<Self, String> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut reader = Reader::from_str(xml);
        let mut walk = Walk::default();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("{e} (at byte {})", reader.error_position()))?;
            match event {
                Event::Start(e) => {
                    let command = walk.element(&e)?;
                    walk.open.push(command);
                }
                Event::Empty(e) => {
                    walk.element(&e)?;
                }
                Event::End(_) => {
                    if walk.open.pop().is_none() {
                        return Err("closing tag without an open element".into());
                    }
                }
                Event::Text(text) if walk.open.is_empty() => {
                    if !text.iter().all(u8::is_ascii_whitespace) {
                        return Err(outside_root(walk.root_seen));
                    }
                }
                Event::CData(_) if walk.open.is_empty() => {
                    return Err(outside_root(walk.root_seen));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !walk.open.is_empty() {
            return Err(format!("{} element(s) not closed", walk.open.len()));
        }
        if !walk.root_seen {
            return Err("no root element".into());
        }
        Ok(walk.device)
    }

    /// Serialize the `<device>` element alone, indented by two spaces.
    pub fn to_element_xml(&self) -> Result<String, String> {
        let mut buffer = String::new();
        let mut ser = Serializer::new(&mut buffer);
        ser.indent(' ', 2);
        self.serialize(ser).map_err(|e| e.to_string())?;
        Ok(buffer)
    }

    /// Serialize with the XML declaration and two-space indentation.
    pub fn to_xml(&self) -> Result<String, String> {
        Ok(format!("{XML_DECLARATION}\n{}\n", self.to_element_xml()?))
    }
}

fn outside_root(root_seen: bool) -> String {
    if root_seen {
        "content after the root element".into()
    } else {
        "content before the root element".into()
    }
}

/// State of one pass over the reader events.
#[derive(Default)]
struct Walk {
    device: DeviceElement,
    /// One entry per open element; `Some(i)` when it is command `i`.
    open: Vec<Option<usize>>,
    root_seen: bool,
}

impl Walk {
    /// Record a start or empty tag. Returns the command index it opened.
    fn element(&mut self, e: &BytesStart<'_>) -> Result<Option<usize>, String> {
        let attrs = attributes(e)?;
        if self.open.is_empty() {
            if self.root_seen {
                return Err(outside_root(true));
            }
            self.root_seen = true;
            self.device.name = lookup(&attrs, b"name").unwrap_or_default();
        }

        let commands = &mut self.device.inputs.commands;
        match e.name().as_ref() {
            b"command" => {
                commands.push(CommandElement {
                    name: lookup(&attrs, b"name"),
                    params: Vec::new(),
                });
                Ok(Some(commands.len() - 1))
            }
            b"param" => {
                let param = ParamElement {
                    name: lookup(&attrs, b"name"),
                    kind: lookup(&attrs, b"type"),
                    value: lookup(&attrs, b"value"),
                };
                // A param belongs to every command it is nested in.
                for index in self.open.iter().flatten() {
                    commands[*index].params.push(param.clone());
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

/// All attributes of a tag, unescaped. Duplicates and bad escapes are errors.
fn attributes(e: &BytesStart<'_>) -> Result<Vec<(Vec<u8>, String)>, String> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| e.to_string())?;
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            Ok((attr.key.as_ref().to_vec(), value.into_owned()))
        })
        .collect()
}

fn lookup(attrs: &[(Vec<u8>, String)], key: &[u8]) -> Option<String> {
    attrs
        .iter()
        .find(|(k, _)| k.as_slice() == key)
        .map(|(_, v)| v.clone())
}
