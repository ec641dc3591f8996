use std::fmt;

/// Administrative command received over the telemetry channel.
///
/// Only [`Unlock`](RemoteCommand::Unlock) is acted on by the access
/// controller; the others are handed back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    Unlock,
    Status,
    Reboot,
    Unknown(String),
}

impl RemoteCommand {
    /// Parse one command line. Surrounding whitespace and case are ignored.
    ///
    /// ```
    /// use securelock_network::RemoteCommand;
    ///
    /// assert_eq!(RemoteCommand::parse("UNLOCK\r"), RemoteCommand::Unlock);
    /// assert_eq!(RemoteCommand::parse("status"), RemoteCommand::Status);
    /// assert_eq!(
    ///     RemoteCommand::parse("OPEN"),
    ///     RemoteCommand::Unknown("OPEN".into())
    /// );
    /// ```
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case("UNLOCK") {
            Self::Unlock
        } else if line.eq_ignore_ascii_case("STATUS") {
            Self::Status
        } else if line.eq_ignore_ascii_case("REBOOT") {
            Self::Reboot
        } else {
            Self::Unknown(line.to_owned())
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlock => f.write_str("UNLOCK"),
            Self::Status => f.write_str("STATUS"),
            Self::Reboot => f.write_str("REBOOT"),
            Self::Unknown(other) => f.write_str(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("UNLOCK", RemoteCommand::Unlock)]
    #[case("  unlock\n", RemoteCommand::Unlock)]
    #[case("STATUS", RemoteCommand::Status)]
    #[case("Reboot", RemoteCommand::Reboot)]
    #[case("UNLOCK NOW", RemoteCommand::Unknown("UNLOCK NOW".into()))]
    #[case("", RemoteCommand::Unknown(String::new()))]
    fn test_parse(#[case] line: &str, #[case] expected: RemoteCommand) {
        assert_eq!(RemoteCommand::parse(line), expected);
    }

    #[test]
    fn test_display_round_trips_known_commands() {
        for command in [RemoteCommand::Unlock, RemoteCommand::Status, RemoteCommand::Reboot] {
            assert_eq!(RemoteCommand::parse(&command.to_string()), command);
        }
    }
}
