//! Interactive console for injecting remote and peer events

use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use crate::endpoint::EndpointKind;
use crate::gateway::GatewayEvent;
use crate::signal::{ButtonEvent, ButtonState, InboundSignal};

pub const HELP: &str = "\
Commands:
  press <index> [name]       remote button pressed
  release <index> [name]     remote button released
  bool <channel> <0|1>       peer boolean signal
  level <channel> <0-65535>  peer unsigned signal
  text <channel> <text...>   peer string signal
  online <remote|peer>       endpoint came online
  offline <remote|peer>      endpoint went offline
  status                     show endpoint and feedback state
  help                       show this help
  quit                       exit";

/// Parsed console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(GatewayEvent),
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb.to_lowercase().as_str() {
            "press" | "release" => {
                let index: u32 = parse_arg(words.next(), "button index")?;
                let rest: Vec<&str> = words.collect();
                let name = if rest.is_empty() {
                    format!("Button{}", index)
                } else {
                    rest.join(" ")
                };
                let state = if verb.eq_ignore_ascii_case("press") {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                Command::Event(GatewayEvent::Button(ButtonEvent::new(index, name, state)))
            }
            "bool" => {
                let channel: u16 = parse_arg(words.next(), "channel")?;
                let value = parse_bool(words.next().ok_or_else(|| anyhow!("missing value"))?)?;
                Command::Event(GatewayEvent::Inbound(InboundSignal::boolean(channel, value)))
            }
            "level" => {
                let channel: u16 = parse_arg(words.next(), "channel")?;
                let value: u16 = parse_arg(words.next(), "level (0-65535)")?;
                Command::Event(GatewayEvent::Inbound(InboundSignal::unsigned(channel, value)))
            }
            "text" => {
                let channel: u16 = parse_arg(words.next(), "channel")?;
                let text = words.collect::<Vec<_>>().join(" ");
                Command::Event(GatewayEvent::Inbound(InboundSignal::string(channel, text)))
            }
            "online" | "offline" => {
                let endpoint = parse_endpoint(words.next())?;
                Command::Event(GatewayEvent::Online {
                    endpoint,
                    online: verb.eq_ignore_ascii_case("online"),
                })
            }
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}' (try 'help')", other),
        };

        Ok(Some(command))
    }
}

fn parse_arg<T>(word: Option<&str>, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let word = word.ok_or_else(|| anyhow!("missing {}", what))?;
    word.parse::<T>()
        .with_context(|| format!("invalid {} '{}'", what, word))
}

fn parse_bool(word: &str) -> Result<bool> {
    match word.to_lowercase().as_str() {
        "1" | "true" | "on" | "high" => Ok(true),
        "0" | "false" | "off" | "low" => Ok(false),
        other => bail!("invalid boolean '{}'", other),
    }
}

fn parse_endpoint(word: Option<&str>) -> Result<EndpointKind> {
    match word.map(str::to_lowercase).as_deref() {
        Some("remote") => Ok(EndpointKind::Remote),
        Some("peer") => Ok(EndpointKind::Peer),
        Some(other) => bail!("unknown endpoint '{}' (remote or peer)", other),
        None => bail!("missing endpoint (remote or peer)"),
    }
}

/// Read console lines and forward parsed commands until quit or EOF
///
/// Blocking; run it on its own thread.
pub fn run_repl(tx: mpsc::Sender<Command>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "Type 'help' for commands".dimmed());

    loop {
        match rl.readline("mlx3> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match Command::parse(&line) {
                    Ok(Some(Command::Help)) => println!("{}", HELP),
                    Ok(Some(command)) => {
                        let quit = command == Command::Quit;
                        if tx.blocking_send(command).is_err() || quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{} {:#}", "error:".red().bold(), e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                let _ = tx.blocking_send(Command::Quit);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
