//! Line-oriented operator console.
//!
//! One verb per line on the input; replies go to the output writer while the
//! operator log (sent/received traffic, connect and file messages) goes to the
//! app's [`LogSink`](crate::log::LogSink). Worker events are applied between
//! input lines.

use crate::app::App;
use crate::error::AppResult;
use crate::protocol::{Command, CommandError, CommandList, ParamKind, Parameter};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// How often pending worker events are applied while waiting for input.
const TICK: Duration = Duration::from_millis(50);

const HELP: &str = "\
Commands:
  help                                  show this text
  ports                                 list detected ports (* = selected)
  refresh                               enumerate ports now
  select <path>                         choose the port used by connect
  connect [path]                        open the selected port or <path>
  disconnect                            close the port
  status                                connection and list summary
  new [name]                            append an empty command
  add <cmd> char|uint8|uint16 [name] [value]
                                        append a parameter to a command
  set <cmd> <param> <text>              edit a parameter value
  rm <cmd>                              remove a command
  list                                  show all commands
  send <cmd>                            send a command
  open <file>                           load commands from a file
  save <file>                           write commands to a file
  quit                                  leave
<cmd> and <param> are indexes or names.";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Help,
    Ports,
    Refresh,
    Select(String),
    Connect(Option<String>),
    Disconnect,
    Status,
    New(String),
    Add {
        command: String,
        kind: ParamKind,
        name: String,
        value: Option<String>,
    },
    Set {
        command: String,
        parameter: String,
        text: String,
    },
    Remove(String),
    List,
    Send(String),
    Open(PathBuf),
    Save(PathBuf),
    Quit,
}

/// Whether the console keeps going after a verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Verb>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = words.first() else {
        return Ok(None);
    };
    let arg = |at: usize, what: &str| {
        words
            .get(at)
            .map(|w| w.to_string())
            .ok_or_else(|| format!("{head}: missing {what}"))
    };

    let verb = match head {
        "help" | "?" => Verb::Help,
        "ports" => Verb::Ports,
        "refresh" => Verb::Refresh,
        "select" => Verb::Select(arg(1, "path")?),
        "connect" => Verb::Connect(arg(1, "path").ok()),
        "disconnect" => Verb::Disconnect,
        "status" => Verb::Status,
        "new" => Verb::New(arg(1, "name").unwrap_or_default()),
        "add" => {
            let kind = arg(2, "type")?;
            Verb::Add {
                command: arg(1, "command")?,
                kind: kind
                    .parse()
                    .map_err(|_| format!("add: unknown type '{kind}'"))?,
                name: arg(3, "name").unwrap_or_default(),
                value: arg(4, "value").ok(),
            }
        }
        "set" => Verb::Set {
            command: arg(1, "command")?,
            parameter: arg(2, "parameter")?,
            text: words.get(3..).unwrap_or_default().join(" "),
        },
        "rm" | "remove" => Verb::Remove(arg(1, "command")?),
        "list" | "ls" => Verb::List,
        "send" => Verb::Send(arg(1, "command")?),
        "open" => Verb::Open(PathBuf::from(arg(1, "file")?)),
        "save" => Verb::Save(PathBuf::from(arg(1, "file")?)),
        "quit" | "exit" => Verb::Quit,
        other => return Err(format!("Unknown command '{other}', try 'help'")),
    };
    Ok(Some(verb))
}

/// Resolve a command reference: an index, else the first command with that name.
fn find_command(list: &CommandList, key: &str) -> Result<usize, CommandError> {
    if let Ok(index) = key.parse::<usize>() {
        return if index < list.len() {
            Ok(index)
        } else {
            Err(CommandError::NoSuchCommand(index))
        };
    }
    list.iter()
        .position(|c| c.name() == key)
        .ok_or_else(|| CommandError::UnknownCommand(key.to_string()))
}

fn find_parameter(command: &Command, index: usize, key: &str) -> Result<usize, CommandError> {
    if let Ok(p) = key.parse::<usize>() {
        return if p < command.parameters().len() {
            Ok(p)
        } else {
            Err(CommandError::NoSuchParameter(index, p))
        };
    }
    command
        .parameters()
        .iter()
        .position(|p| p.name() == key)
        .ok_or_else(|| CommandError::UnknownParameter(key.to_string()))
}

fn write_command(out: &mut dyn Write, index: usize, command: &Command) -> std::io::Result<()> {
    write!(out, "[{}] {}:", index, command.name())?;
    for param in command.parameters() {
        write!(
            out,
            " {}({})='{}'",
            param.name(),
            param.kind(),
            param.display_value()
        )?;
    }
    writeln!(out)
}

/// Run one verb against the app.
///
/// Errors from the app are reported on `out` and do not end the console;
/// only a failing writer does.
pub fn execute(app: &mut App, verb: Verb, out: &mut dyn Write) -> std::io::Result<Flow> {
    debug!("Console verb: {:?}", verb);
    let result: AppResult<()> = match verb {
        Verb::Help => {
            writeln!(out, "{}", HELP)?;
            Ok(())
        }
        Verb::Ports => {
            if app.ports().is_empty() {
                writeln!(out, "No ports detected")?;
            }
            for port in app.ports() {
                let mark = if Some(port.as_str()) == app.selected() { '*' } else { ' ' };
                writeln!(out, "{} {}", mark, port)?;
            }
            Ok(())
        }
        Verb::Refresh => match app.refresh_ports() {
            Ok(ports) => {
                writeln!(out, "{} port(s)", ports.len())?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        Verb::Select(path) => {
            app.select(&path);
            Ok(())
        }
        Verb::Connect(path) => app.connect(path.as_deref()),
        Verb::Disconnect => {
            app.disconnect();
            Ok(())
        }
        Verb::Status => {
            match app.link().port_path() {
                Some(path) => writeln!(
                    out,
                    "Connected to {} at {} baud",
                    path,
                    app.link().baud_rate().unwrap_or_default()
                )?,
                None => writeln!(out, "Not connected")?,
            }
            writeln!(
                out,
                "{} command(s), sending {}",
                app.list().len(),
                if app.list().send_enabled() { "enabled" } else { "disabled" }
            )?;
            Ok(())
        }
        Verb::New(name) => {
            app.list_mut().add(name);
            writeln!(out, "[{}] added", app.list().len() - 1)?;
            Ok(())
        }
        Verb::Add {
            command,
            kind,
            name,
            value,
        } => add_parameter(app.list_mut(), &command, kind, name, value.as_deref()),
        Verb::Set {
            command,
            parameter,
            text,
        } => set_parameter(app.list_mut(), &command, &parameter, &text),
        Verb::Remove(command) => find_command(app.list(), &command)
            .and_then(|index| app.list_mut().remove(index))
            .map(|_| ())
            .map_err(Into::into),
        Verb::List => {
            for (index, command) in app.list().iter().enumerate() {
                write_command(out, index, command)?;
            }
            Ok(())
        }
        Verb::Send(command) => find_command(app.list(), &command)
            .map_err(Into::into)
            .and_then(|index| app.send(index))
            .map(|_| ()),
        Verb::Open(path) => match app.open(&path) {
            Ok(diagnostics) => {
                if !diagnostics.is_empty() {
                    writeln!(out, "{} parameter(s) skipped", diagnostics.len())?;
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        Verb::Save(path) => app.save(&path),
        Verb::Quit => return Ok(Flow::Quit),
    };

    if let Err(e) = result {
        writeln!(out, "error: {}", e)?;
    }
    Ok(Flow::Continue)
}

fn add_parameter(
    list: &mut CommandList,
    command: &str,
    kind: ParamKind,
    name: String,
    value: Option<&str>,
) -> AppResult<()> {
    let index = find_command(list, command)?;
    let command = list
        .get_mut(index)
        .ok_or(CommandError::NoSuchCommand(index))?;
    let mut param = Parameter::with_default(name, kind);
    if let Some(value) = value {
        param.set_text(value)?;
    }
    command.push(param);
    Ok(())
}

fn set_parameter(list: &mut CommandList, command: &str, parameter: &str, text: &str) -> AppResult<()> {
    let index = find_command(list, command)?;
    let command = list
        .get_mut(index)
        .ok_or(CommandError::NoSuchCommand(index))?;
    let p = find_parameter(command, index, parameter)?;
    command
        .parameter_mut(p)
        .ok_or(CommandError::NoSuchParameter(index, p))?
        .set_text(text)?;
    Ok(())
}

/// Forward input lines from a blocking reader on its own thread.
fn spawn_input<R>(input: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Input error: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn prompt(out: &mut dyn Write) -> std::io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

/// Run the console until `quit` or end of input, then shut the app down.
pub fn run<R>(mut app: App, input: R, out: &mut dyn Write) -> AppResult<()>
where
    R: BufRead + Send + 'static,
{
    let (events_tx, events) = mpsc::channel();
    app.start_workers(events_tx)?;
    let lines = spawn_input(input);

    prompt(out)?;
    loop {
        for event in events.try_iter() {
            app.handle_event(&event);
        }
        match lines.recv_timeout(TICK) {
            Ok(line) => {
                match parse_line(&line) {
                    Ok(Some(verb)) => {
                        if execute(&mut app, verb, out)? == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => writeln!(out, "{}", message)?,
                }
                prompt(out)?;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    app.shutdown();
    Ok(())
}
