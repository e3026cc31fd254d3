use std::str::FromStr;

use anyhow::{anyhow, bail};
use transfer_client::SessionEvent;

pub const HELP: &str = "\
commands:
  connect            connect the wallet
  disconnect         forget the current connection
  chain <name>       switch to arbitrum, optimism or base
  amount <eth>       set the transfer amount
  transfer           send the transfer
  lookup <address>   balance of an address on the inventory chain
  refresh            re-read the inventory balance
  close              dismiss the notification
  help               show this message
  quit               exit";

/// A line typed at the console prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Chain(String),
    Amount(String),
    Transfer,
    Lookup(String),
    Refresh,
    Close,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            bail!("empty command");
        };
        let arg = parts.next().map(str::to_string);

        let command = match word.to_lowercase().as_str() {
            "connect" => Command::Connect,
            "disconnect" => Command::Disconnect,
            "chain" => Command::Chain(arg.ok_or_else(|| anyhow!("usage: chain <name>"))?),
            // an empty amount clears the input
            "amount" => Command::Amount(arg.unwrap_or_default()),
            "transfer" | "send" => Command::Transfer,
            "lookup" => Command::Lookup(arg.ok_or_else(|| anyhow!("usage: lookup <address>"))?),
            "refresh" => Command::Refresh,
            "close" => Command::Close,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`, try `help`"),
        };

        Ok(command)
    }
}

impl Command {
    /// Session event for the command; `None` for console-local commands
    pub fn into_event(self) -> Option<SessionEvent> {
        match self {
            Command::Connect => Some(SessionEvent::Connect),
            Command::Disconnect => Some(SessionEvent::Disconnect),
            Command::Chain(name) => Some(SessionEvent::SelectChain(name)),
            Command::Amount(amount) => Some(SessionEvent::AmountInput(amount)),
            Command::Transfer => Some(SessionEvent::Submit),
            Command::Lookup(address) => Some(SessionEvent::LookupBalance(address)),
            Command::Refresh => Some(SessionEvent::RefreshInventory),
            Command::Close => Some(SessionEvent::CloseNotification),
            Command::Quit => Some(SessionEvent::Shutdown),
            Command::Help => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("connect".parse::<Command>().unwrap(), Command::Connect);
        assert_eq!(
            "  Chain optimism ".parse::<Command>().unwrap(),
            Command::Chain("optimism".to_string())
        );
        assert_eq!(
            "amount 0.25".parse::<Command>().unwrap(),
            Command::Amount("0.25".to_string())
        );
        assert_eq!("amount".parse::<Command>().unwrap(), Command::Amount(String::new()));
        assert_eq!("send".parse::<Command>().unwrap(), Command::Transfer);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Command>().is_err());
        assert!("chain".parse::<Command>().is_err());
        assert!("lookup".parse::<Command>().is_err());
        assert!("bridge 1".parse::<Command>().is_err());
    }

    #[test]
    fn test_events() {
        assert_eq!(Command::Transfer.into_event(), Some(SessionEvent::Submit));
        assert_eq!(Command::Quit.into_event(), Some(SessionEvent::Shutdown));
        assert_eq!(
            Command::Lookup("0xabc".to_string()).into_event(),
            Some(SessionEvent::LookupBalance("0xabc".to_string()))
        );
        assert_eq!(Command::Help.into_event(), None);
    }
}
