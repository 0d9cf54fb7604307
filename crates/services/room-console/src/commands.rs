//! Console command parsing

use anyhow::{anyhow, bail, Result};
use roomlink_client::TrackKind;
use std::str::FromStr;

/// One line typed at the console prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Url(String),
    Token(String),
    Connect,
    Disconnect,
    /// Push-to-talk press
    Talk,
    /// Push-to-talk release
    Release,
    Toggle { participant_id: String, kind: TrackKind },
    /// Simulated remote participant joins
    Join { sid: String, identity: String },
    /// Simulated remote participant leaves
    Leave(String),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  url <wss://...>              set server url
  token <jwt>                  set access token
  connect | disconnect
  talk | release               push-to-talk press / release
  toggle <participant> <audio|video>
  join <sid> [identity]        add a simulated remote participant
  leave <sid>                  remove a simulated remote participant
  status | help | quit";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            bail!("empty command");
        };
        let mut arg = |name: &str| {
            parts
                .next()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("missing <{}> for '{}'", name, verb))
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "url" => Command::Url(arg("url")?),
            "token" => Command::Token(arg("token")?),
            "connect" => Command::Connect,
            "disconnect" => Command::Disconnect,
            "talk" => Command::Talk,
            "release" => Command::Release,
            "toggle" => {
                let participant_id = arg("participant")?;
                let kind = arg("kind")?.parse::<TrackKind>()?;
                Command::Toggle {
                    participant_id,
                    kind,
                }
            }
            "join" => {
                let sid = arg("sid")?;
                let identity = arg("identity").unwrap_or_default();
                Command::Join { sid, identity }
            }
            "leave" => Command::Leave(arg("sid")?),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}', try 'help'", other),
        };

        Ok(command)
    }
}
