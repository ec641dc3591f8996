//! Line commands typed into the emulator.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use securelock_core::{CardUid, FaultError};

pub const HELP: &str = "\
commands:
  card <8 hex>   place a card on the reader
  remove         take the card away
  keys <keys>    type on the keypad (0-9, * erases, # submits)
  unlock         remote UNLOCK
  status         remote STATUS
  hold           long-press the maintenance button
  fault [kind]   raise a fault (bus, memory, hard, usage)
  reset          external reset
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Card(CardUid),
    Remove,
    Keys(String),
    Unlock,
    Status,
    Hold,
    Fault(FaultError),
    Reset,
    Quit,
    Help,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let arg = words.next();

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("card", Some(uid)) => Self::Card(
                uid.parse()
                    .with_context(|| format!("bad card identifier '{uid}'"))?,
            ),
            ("card", None) => bail!("usage: card <8 hex digits>"),
            ("remove", _) => Self::Remove,
            ("keys", Some(keys)) => Self::Keys(keys.to_owned()),
            ("keys", None) => bail!("usage: keys <keys>"),
            ("unlock", _) => Self::Unlock,
            ("status", _) => Self::Status,
            ("hold", _) => Self::Hold,
            ("fault", kind) => Self::Fault(parse_fault(kind.unwrap_or("hard"))?),
            ("reset", _) => Self::Reset,
            ("quit" | "exit", _) => Self::Quit,
            ("help" | "?", _) => Self::Help,
            (other, _) => return Err(anyhow!("unknown command '{other}', try 'help'")),
        };
        Ok(command)
    }
}

fn parse_fault(kind: &str) -> Result<FaultError> {
    match kind.to_ascii_lowercase().as_str() {
        "bus" => Ok(FaultError::BusFault),
        "memory" | "mem" => Ok(FaultError::MemoryFault),
        "hard" => Ok(FaultError::HardFault),
        "usage" => Ok(FaultError::UsageFault),
        other => bail!("unknown fault kind '{other}'"),
    }
}
