//! A named, ordered group of parameters sent as one buffer.

use super::document::CommandElement;
use super::error::{CommandError, ParamError};
use super::parameter::Parameter;
use crate::link::SerialLink;
use crate::log::LogSink;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    name: String,
    parameters: Vec<Parameter>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter_mut(&mut self, index: usize) -> Option<&mut Parameter> {
        self.parameters.get_mut(index)
    }

    /// Append a parameter. Names are not de-duplicated.
    pub fn push(&mut self, parameter: Parameter) -> &mut Parameter {
        self.parameters.push(parameter);
        let last = self.parameters.len() - 1;
        &mut self.parameters[last]
    }

    pub fn add_char(&mut self, name: impl Into<String>, value: &str) -> &mut Parameter {
        self.push(Parameter::char(name, value))
    }

    pub fn add_uint8(&mut self, name: impl Into<String>, value: u8) -> &mut Parameter {
        self.push(Parameter::uint8(name, value))
    }

    pub fn add_uint16(&mut self, name: impl Into<String>, value: u16) -> &mut Parameter {
        self.push(Parameter::uint16(name, value))
    }

    /// All parameter bytes concatenated in order.
    ///
    /// Fails as a whole if any parameter has no encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CommandError> {
        let mut buffer = Vec::new();
        for parameter in &self.parameters {
            let bytes = parameter
                .to_bytes()
                .map_err(|source| CommandError::MissingValue {
                    command: self.name.clone(),
                    source,
                })?;
            buffer.extend_from_slice(&bytes);
        }
        Ok(buffer)
    }

    pub fn to_element(&self) -> Result<CommandElement, ParamError> {
        Ok(CommandElement {
            name: Some(self.name.clone()),
            params: self
                .parameters
                .iter()
                .map(Parameter::to_element)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Encode and write the command to `link`, logging what went out.
    ///
    /// Nothing is written when a parameter cannot be encoded. Returns the bytes
    /// handed to the link.
    pub fn send(&self, link: &SerialLink, log: &dyn LogSink) -> Result<Vec<u8>, CommandError> {
        let buffer = match self.to_bytes() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Not sending '{}': {}", self.name, e);
                log.write_message("Missing values");
                return Err(e);
            }
        };

        link.send(&buffer)?;
        debug!("Sent {} bytes for '{}'", buffer.len(), self.name);
        log.write_message(&send_line(&buffer));
        Ok(buffer)
    }
}

/// `Send: '<escaped bytes>' (<hex>)`
pub fn send_line(buffer: &[u8]) -> String {
    format!("Send: '{}' ({})", buffer.escape_ascii(), hex::encode(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLog;
    use crate::port::MockOpener;
    use crate::protocol::ParamKind;

    fn sample() -> Command {
        let mut command = Command::new("probe");
        command.add_char("a", "A");
        command.add_uint8("b", 0xff);
        command.add_uint16("c", 0x00ff);
        command
    }

    #[test]
    fn test_concatenation_order() {
        assert_eq!(sample().to_bytes().unwrap(), b"A\xff\x00\xff");
    }

    #[test]
    fn test_send_writes_and_logs_hex() {
        let opener = MockOpener::new();
        let probe = opener.add_port("MOCK0");
        let link = SerialLink::new(opener);
        link.connect("MOCK0", 9600).unwrap();
        let log = MemoryLog::new();

        let sent = sample().send(&link, &log).unwrap();

        assert_eq!(sent, b"A\xff\x00\xff");
        assert_eq!(probe.written_bytes(), b"A\xff\x00\xff");
        let lines = log.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("(41ff00ff)"), "got {}", lines[0]);
        assert!(lines[0].starts_with("Send: 'A\\xff\\x00\\xff'"));
    }

    #[test]
    fn test_missing_value_aborts_whole_send() {
        let opener = MockOpener::new();
        let probe = opener.add_port("MOCK0");
        let link = SerialLink::new(opener);
        link.connect("MOCK0", 9600).unwrap();
        let log = MemoryLog::new();

        let mut command = sample();
        command.push(Parameter::blank("d", ParamKind::Uint8));

        let err = command.send(&link, &log).unwrap_err();
        assert!(matches!(err, CommandError::MissingValue { ref command, .. } if command == "probe"));
        assert!(probe.get_write_log().is_empty());
        assert_eq!(log.lines(), vec!["Missing values"]);
    }

    #[test]
    fn test_write_failure_propagates() {
        let opener = MockOpener::new();
        let mut probe = opener.add_port("MOCK0");
        probe.set_fail_writes(true);
        let link = SerialLink::new(opener);
        link.connect("MOCK0", 9600).unwrap();
        let log = MemoryLog::new();

        let err = sample().send(&link, &log).unwrap_err();
        assert!(matches!(err, CommandError::Link(_)));
        assert!(log.lines().is_empty());
    }

    #[test]
    fn test_empty_command_sends_empty_buffer() {
        let command = Command::new("noop");
        assert!(command.to_bytes().unwrap().is_empty());
        assert_eq!(send_line(&[]), "Send: '' ()");
    }

    #[test]
    fn test_duplicate_names_are_kept() {
        let mut command = Command::new("dup");
        command.add_uint8("x", 1);
        command.add_uint8("x", 2);
        assert_eq!(command.parameters().len(), 2);
        assert_eq!(command.to_bytes().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_element_keeps_order() {
        let element = sample().to_element().unwrap();
        assert_eq!(element.name.as_deref(), Some("probe"));
        let kinds: Vec<_> = element
            .params
            .iter()
            .map(|p| p.kind.clone().unwrap_or_default())
            .collect();
        assert_eq!(kinds, vec!["char", "uint8", "uint16"]);
    }
}
