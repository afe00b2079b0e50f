//! Command-line handling for `mllpd [CONFIG FLAGS] [PORT]`.
//!
//! Configuration flags are forwarded to `ortho_config`; a single trailing
//! positional argument is read as the listen port.

use std::ffi::{OsStr, OsString};

/// Flags understood by the configuration loader.
///
/// Keep in sync with the fields of `mllp_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--listen-host",
    "--listen-port",
    "--application-id",
    "--facility-id",
    "--supported-versions",
    "--message-structure-prefix",
    "--max-frame-bytes",
    "--log-filter",
    "--log-format",
];

#[derive(Debug, Clone, Copy)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

/// Arguments split into loader flags and the positional port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    config_arguments: Vec<OsString>,
    port: PortArgument,
}

/// State of the optional positional port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PortArgument {
    /// No positional port was given.
    #[default]
    Absent,
    /// A valid port was given.
    Port(u16),
    /// The positional arguments did not name a single valid port; the
    /// configured port applies.
    Ignored(String),
}

impl CommandLine {
    /// Splits `args` (program name first).
    ///
    /// Configuration flags must precede the port. The port is honoured only
    /// when exactly one positional argument remains and it parses as `u16`.
    #[must_use]
    pub fn parse<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut iter = args.into_iter().map(Into::<OsString>::into);
        let mut config_arguments = Vec::new();
        if let Some(program) = iter.next() {
            config_arguments.push(program);
        }

        let mut positional = Vec::new();
        let mut pending_value = false;
        for argument in iter.by_ref() {
            if pending_value {
                config_arguments.push(argument);
                pending_value = false;
                continue;
            }
            match process_config_flag(&argument) {
                FlagAction::Include { needs_value } => {
                    config_arguments.push(argument);
                    pending_value = needs_value;
                }
                FlagAction::Skip => {
                    positional.push(argument);
                    break;
                }
            }
        }
        positional.extend(iter);

        Self {
            config_arguments,
            port: classify_port(&positional),
        }
    }

    /// Arguments to hand to the configuration loader.
    #[must_use]
    pub fn config_arguments(&self) -> &[OsString] {
        &self.config_arguments
    }

    /// Positional port state.
    #[must_use]
    pub const fn port(&self) -> &PortArgument {
        &self.port
    }

    /// The port override, if a valid one was given.
    #[must_use]
    pub const fn port_override(&self) -> Option<u16> {
        match self.port {
            PortArgument::Port(port) => Some(port),
            PortArgument::Absent | PortArgument::Ignored(_) => None,
        }
    }
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Skip;
    }
    let flag = text.split_once('=').map_or(text.as_ref(), |(name, _)| name);
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !text.contains('='),
        }
    } else {
        FlagAction::Skip
    }
}

fn classify_port(positional: &[OsString]) -> PortArgument {
    match positional {
        [] => PortArgument::Absent,
        [single] => {
            let text = single.to_string_lossy();
            text.trim()
                .parse::<u16>()
                .map_or_else(|_| PortArgument::Ignored(text.into_owned()), PortArgument::Port)
        }
        many => PortArgument::Ignored(
            many.iter()
                .map(|argument| argument.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        ),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case(&["mllpd"], PortArgument::Absent)]
    #[case(&["mllpd", "2575"], PortArgument::Port(2575))]
    #[case(&["mllpd", "abc"], PortArgument::Ignored("abc".to_owned()))]
    #[case(&["mllpd", "70000"], PortArgument::Ignored("70000".to_owned()))]
    #[case(&["mllpd", "1", "2"], PortArgument::Ignored("1 2".to_owned()))]
    fn reads_the_positional_port(#[case] args: &[&str], #[case] expected: PortArgument) {
        assert_eq!(CommandLine::parse(os(args)).port(), &expected);
    }

    #[test]
    fn forwards_configuration_flags() {
        let command = CommandLine::parse(os(&[
            "mllpd",
            "--log-format",
            "compact",
            "--application-id=Lab",
            "2575",
        ]));
        assert_eq!(
            command.config_arguments(),
            os(&["mllpd", "--log-format", "compact", "--application-id=Lab"])
        );
        assert_eq!(command.port_override(), Some(2575));
    }

    #[test]
    fn unknown_flags_are_positional() {
        let command = CommandLine::parse(os(&["mllpd", "--verbose"]));
        assert_eq!(command.config_arguments(), os(&["mllpd"]));
        assert_eq!(
            command.port(),
            &PortArgument::Ignored("--verbose".to_owned())
        );
    }
}
