//! The editable list of commands and its persistence.
//!
//! Opening is best effort: a document that parses replaces the whole list,
//! and every `<param>` that cannot be understood is skipped with a
//! [`Diagnostic`] while the rest of the document still loads.

use super::command::Command;
use super::document::{CommandElement, DeviceElement, InputsElement, ParamElement, XML_DECLARATION};
use super::error::{CommandError, DocumentError};
use super::parameter::{ParamKind, Parameter};
use crate::link::SerialLink;
use crate::log::LogSink;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// A recoverable problem found while loading one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `type` missing or not one of the known kinds.
    MissingType {
        command: String,
        parameter: String,
        kind: Option<String>,
    },
    /// Value of a numeric parameter is absent, not a number or out of range.
    InvalidValue {
        command: String,
        parameter: String,
        kind: ParamKind,
        value: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingType { command, .. } => {
                write!(f, "Error in command {command}: parameter without type")
            }
            Self::InvalidValue { command, .. } => {
                write!(f, "Error in command {command}: missing or not numerical value")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    commands: Vec<Command>,
    send_enabled: bool,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new empty command and return it for editing.
    pub fn add(&mut self, name: impl Into<String>) -> &mut Command {
        self.push(Command::new(name))
    }

    pub fn push(&mut self, command: Command) -> &mut Command {
        self.commands.push(command);
        let last = self.commands.len() - 1;
        &mut self.commands[last]
    }

    /// Detach a command from the list and hand it back.
    pub fn remove(&mut self, index: usize) -> Result<Command, CommandError> {
        if index < self.commands.len() {
            Ok(self.commands.remove(index))
        } else {
            Err(CommandError::NoSuchCommand(index))
        }
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Command> {
        self.commands.get_mut(index)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn send_enabled(&self) -> bool {
        self.send_enabled
    }

    /// Gate sending; follows the link's connection state. Editing is unaffected.
    pub fn set_send_enabled(&mut self, enabled: bool) {
        self.send_enabled = enabled;
    }

    /// Send the command at `index` if sending is enabled.
    pub fn send(
        &self,
        index: usize,
        link: &SerialLink,
        log: &dyn LogSink,
    ) -> Result<Vec<u8>, CommandError> {
        if !self.send_enabled {
            return Err(CommandError::SendDisabled);
        }
        self.commands
            .get(index)
            .ok_or(CommandError::NoSuchCommand(index))?
            .send(link, log)
    }

    /// Document form of the whole list.
    pub fn to_document(&self) -> Result<DeviceElement, DocumentError> {
        Ok(DeviceElement {
            name: String::new(),
            inputs: InputsElement {
                commands: self
                    .commands
                    .iter()
                    .map(Command::to_element)
                    .collect::<Result<_, _>>()?,
            },
        })
    }

    pub fn to_xml(&self) -> Result<String, DocumentError> {
        self.to_document()?
            .to_xml()
            .map_err(DocumentError::Serialize)
    }

    /// Write the list to `path`, replacing whatever is there.
    ///
    /// The `<device>` element is echoed to the log before it is written.
    pub fn save(&self, path: &Path, log: &dyn LogSink) -> Result<(), DocumentError> {
        log.write_message(&format!("Save to {}", path.display()));
        let xml = self.to_xml()?;
        log.write_message(xml.trim_start_matches(XML_DECLARATION).trim());
        std::fs::write(path, xml.as_bytes()).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved {} command(s) to {}", self.commands.len(), path.display());
        Ok(())
    }

    /// Replace the list with the commands in `path`.
    ///
    /// If the file is missing or not well-formed XML the list is left as it
    /// was. Per-parameter problems are logged, skipped and returned.
    pub fn open(&mut self, path: &Path, log: &dyn LogSink) -> Result<Vec<Diagnostic>, DocumentError> {
        log.write_message(&format!("Open {}", path.display()));
        let result = read_document(path).map(|doc| self.load_document(&doc, log));
        if let Err(e) = &result {
            warn!("Open failed: {}", e);
            match e {
                DocumentError::NotFound(_) => {
                    log.write_message(&format!("Unknown file {}", path.display()))
                }
                DocumentError::Format { .. } => {
                    log.write_message(&format!("Unknown file structure {}", path.display()))
                }
                other => log.write_message(&other.to_string()),
            }
        }
        result
    }

    /// Replace the list with the commands of an XML string.
    pub fn load_xml(&mut self, xml: &str, log: &dyn LogSink) -> Result<Vec<Diagnostic>, DocumentError> {
        let doc = DeviceElement::from_xml(xml).map_err(|message| DocumentError::Format {
            path: Default::default(),
            message,
        })?;
        Ok(self.load_document(&doc, log))
    }

    fn load_document(&mut self, doc: &DeviceElement, log: &dyn LogSink) -> Vec<Diagnostic> {
        self.commands.clear();
        let mut diagnostics = Vec::new();
        for element in &doc.inputs.commands {
            let command = decode_command(element, log, &mut diagnostics);
            self.commands.push(command);
        }
        info!(
            "Loaded {} command(s), {} diagnostic(s)",
            self.commands.len(),
            diagnostics.len()
        );
        diagnostics
    }
}

fn read_document(path: &Path) -> Result<DeviceElement, DocumentError> {
    let xml = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => DocumentError::NotFound(path.to_path_buf()),
        _ => DocumentError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    DeviceElement::from_xml(&xml).map_err(|message| DocumentError::Format {
        path: path.to_path_buf(),
        message,
    })
}

fn decode_command(
    element: &CommandElement,
    log: &dyn LogSink,
    diagnostics: &mut Vec<Diagnostic>,
) -> Command {
    let name = element.name.clone().unwrap_or_default();
    log.write_message(&format!("Command {name}"));

    let mut command = Command::new(name.as_str());
    for param in &element.params {
        match decode_param(&name, param, log) {
            Ok(parameter) => {
                command.push(parameter);
            }
            Err(diagnostic) => {
                warn!("{}", diagnostic);
                log.write_message(&diagnostic.to_string());
                diagnostics.push(diagnostic);
            }
        }
    }
    command
}

fn decode_param(command: &str, element: &ParamElement, log: &dyn LogSink) -> Result<Parameter, Diagnostic> {
    let name = element.name.clone().unwrap_or_default();
    let kind = element
        .kind
        .as_deref()
        .and_then(|k| k.parse::<ParamKind>().ok())
        .ok_or_else(|| Diagnostic::MissingType {
            command: command.to_string(),
            parameter: name.clone(),
            kind: element.kind.clone(),
        })?;
    let value = element.value.clone().unwrap_or_default();
    log.write_message(&format!("Parameter {name}({kind}) {value}"));

    let invalid = || Diagnostic::InvalidValue {
        command: command.to_string(),
        parameter: name.clone(),
        kind,
        value: value.clone(),
    };

    let parameter = match kind {
        ParamKind::Char => Parameter::char(name.as_str(), &value),
        ParamKind::Uint8 => {
            let v = value.trim().parse::<u8>().map_err(|_| invalid())?;
            Parameter::uint8(name.as_str(), v)
        }
        ParamKind::Uint16 => {
            let v = value.trim().parse::<u16>().map_err(|_| invalid())?;
            Parameter::uint16(name.as_str(), v)
        }
    };
    Ok(parameter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLog;
    use crate::port::MockOpener;
    use pretty_assertions::assert_eq;

    fn three_commands() -> CommandList {
        let mut list = CommandList::new();
        list.add("one").add_char("c", "1");
        list.add("two").add_uint8("b", 2);
        list.add("three").add_uint16("w", 3);
        list
    }

    #[test]
    fn test_add_and_remove() {
        let mut list = three_commands();
        let removed = list.remove(1).unwrap();
        assert_eq!(removed.name(), "two");
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).unwrap().name(), "three");
        assert!(matches!(list.remove(5), Err(CommandError::NoSuchCommand(5))));
    }

    #[test]
    fn test_send_gated_by_connection_state() {
        let opener = MockOpener::new();
        let probe = opener.add_port("MOCK0");
        let link = SerialLink::new(opener);
        link.connect("MOCK0", 9600).unwrap();
        let log = MemoryLog::new();
        let mut list = three_commands();

        assert!(matches!(
            list.send(0, &link, &log),
            Err(CommandError::SendDisabled)
        ));
        assert!(probe.get_write_log().is_empty());

        list.set_send_enabled(true);
        assert_eq!(list.send(0, &link, &log).unwrap(), b"1");
        assert!(matches!(
            list.send(9, &link, &log),
            Err(CommandError::NoSuchCommand(9))
        ));
    }

    #[test]
    fn test_missing_type_skips_only_that_parameter() {
        let xml = r#"<device name=""><inputs>
            <command name="c1">
              <param name="a" value="x"/>
              <param name="b" type="uint8" value="7"/>
            </command>
        </inputs></device>"#;
        let log = MemoryLog::new();
        let mut list = CommandList::new();

        let diagnostics = list.load_xml(xml, &log).unwrap();

        assert_eq!(list.len(), 1);
        let command = list.get(0).unwrap();
        assert_eq!(command.name(), "c1");
        assert_eq!(command.parameters().len(), 1);
        assert_eq!(command.parameters()[0].name(), "b");
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], Diagnostic::MissingType { .. }));
        assert!(log.contains("Error in command c1: parameter without type"));
    }

    #[test]
    fn test_unknown_type_is_a_missing_type() {
        let xml = r#"<device><inputs><command name="c"><param type="float" value="1"/></command></inputs></device>"#;
        let mut list = CommandList::new();
        let diagnostics = list.load_xml(xml, &MemoryLog::new()).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MissingType {
                command: "c".into(),
                parameter: String::new(),
                kind: Some("float".into()),
            }]
        );
    }

    #[test]
    fn test_invalid_numbers_are_skipped() {
        let xml = r#"<device><inputs>
            <command name="n">
              <param name="a" type="uint8" value="abc"/>
              <param name="b" type="uint8" value="256"/>
              <param name="c" type="uint16"/>
              <param name="d" type="uint16" value="513"/>
            </command>
            <command>
              <param name="e" type="char" value="Zed"/>
            </command>
        </inputs></device>"#;
        let log = MemoryLog::new();
        let mut list = CommandList::new();

        let diagnostics = list.load_xml(xml, &log).unwrap();

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .all(|d| matches!(d, Diagnostic::InvalidValue { .. })));
        let first = list.get(0).unwrap();
        assert_eq!(first.parameters().len(), 1);
        assert_eq!(first.parameters()[0].display_value(), "0201");

        let second = list.get(1).unwrap();
        assert_eq!(second.name(), "");
        assert_eq!(second.parameters()[0].display_value(), "Z");
        assert!(log.contains("missing or not numerical value"));
    }

    #[test]
    fn test_load_replaces_existing_commands_but_keeps_gate() {
        let mut list = three_commands();
        list.set_send_enabled(true);
        list.load_xml(r#"<device><inputs><command name="only"/></inputs></device>"#, &MemoryLog::new())
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().name(), "only");
        assert!(list.send_enabled());
    }

    #[test]
    fn test_malformed_xml_leaves_list_untouched() {
        let mut list = three_commands();
        let before = list.clone();
        let err = list
            .load_xml("<device><inputs><command", &MemoryLog::new())
            .unwrap_err();
        assert!(matches!(err, DocumentError::Format { .. }));
        assert_eq!(list, before);
    }

    #[test]
    fn test_commands_are_found_at_any_depth() {
        let xml = r#"<device name="">
            <command name="a"><param name="p" type="uint8" value="1"/></command>
            <inputs>
              <command name="b">
                <group><param name="q" type="uint16" value="2"/></group>
              </command>
            </inputs>
        </device>"#;
        let mut list = three_commands();

        let diagnostics = list.load_xml(xml, &MemoryLog::new()).unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().to_bytes().unwrap(), vec![0x01]);
        assert_eq!(list.get(1).unwrap().to_bytes().unwrap(), vec![0x00, 0x02]);
    }

    #[test]
    fn test_trailing_garbage_leaves_list_untouched() {
        let mut list = three_commands();
        let before = list.clone();
        let log = MemoryLog::new();

        let err = list
            .load_xml(
                r#"<device><inputs><command name="x"/></inputs></device><trailing attr="#,
                &log,
            )
            .unwrap_err();

        assert!(matches!(err, DocumentError::Format { .. }));
        assert_eq!(list, before);
        assert!(log.lines().is_empty());
    }

    #[test]
    fn test_save_echoes_document_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.xml");
        let log = MemoryLog::new();

        three_commands().save(&path, &log).unwrap();

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("Save to {}", path.display()));
        assert!(lines[1].starts_with("<device"), "{}", lines[1]);
        assert!(lines[1].contains(r#"<command name="two">"#));
        assert!(!lines[1].contains("<?xml"));
    }

    #[test]
    fn test_unsavable_parameter_fails_save() {
        let mut list = CommandList::new();
        list.add("c").push(Parameter::blank("x", ParamKind::Uint8));
        assert!(matches!(list.to_xml(), Err(DocumentError::Param(_))));
    }

    #[test]
    fn test_diagnostic_messages() {
        let d = Diagnostic::InvalidValue {
            command: "go".into(),
            parameter: "p".into(),
            kind: ParamKind::Uint8,
            value: "x".into(),
        };
        assert_eq!(d.to_string(), "Error in command go: missing or not numerical value");
    }
}
