//! Command model: typed parameters, commands, the command list and the XML
//! protocol document they are stored in.

pub mod command;
pub mod document;
pub mod error;
pub mod list;
pub mod parameter;

pub use command::{send_line, Command};
pub use document::{CommandElement, DeviceElement, InputsElement, ParamElement, XML_DECLARATION};
pub use error::{CommandError, DocumentError, ParamError};
pub use list::{CommandList, Diagnostic};
pub use parameter::{ParamKind, Parameter, UnknownKind};
