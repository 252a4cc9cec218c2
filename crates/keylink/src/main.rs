mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "keylink", version, about = "Key/value telemetry over a serial line")]
struct Cli {
    /// Output format. Defaults to a table on a terminal, JSON otherwise.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log line encoding on stderr.
    #[arg(long, value_name = "FORMAT", env = "KEYLINK_LOG_FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Level for keylink's own events; other crates stay at warn or quieter.
    #[arg(long, value_name = "LEVEL", env = "KEYLINK_LOG_LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn run(self) -> i32 {
        init_logging(self.log_format, self.log_level);
        let format = self.format.unwrap_or_else(OutputFormat::default_for_stdout);

        match cmd::run(self.command, format) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("error: {err}");
                err.code
            }
        }
    }
}

fn main() {
    std::process::exit(Cli::parse().run());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::Role;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "keylink",
            "send",
            "/dev/ttyUSB0",
            "--key",
            "2",
            "--value",
            "-300",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.key, 2);
        assert_eq!(args.value, "-300");
        assert_eq!(args.link.baud, 19_200);
        assert_eq!(args.link.role, Role::Responder);
    }

    #[test]
    fn parses_listen_with_key_filter() {
        let cli = Cli::try_parse_from([
            "keylink",
            "--format",
            "json",
            "listen",
            "COM3",
            "--keys",
            "1,2,7",
            "--count",
            "5",
            "--role",
            "initiator",
            "--baud",
            "9600",
        ])
        .expect("listen args should parse");

        assert_eq!(cli.format, Some(OutputFormat::Json));
        let Command::Listen(args) = cli.command else {
            panic!("expected listen");
        };
        assert_eq!(args.keys, Some(vec![1, 2, 7]));
        assert_eq!(args.count, Some(5));
        assert_eq!(args.link.role, Role::Initiator);
        assert_eq!(args.link.baud, 9_600);
        assert_eq!(args.poll, "10ms");
    }

    #[test]
    fn send_requires_key_and_value() {
        let err = Cli::try_parse_from(["keylink", "send", "/dev/ttyUSB0", "--value", "1"])
            .expect_err("missing key should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_out_of_range_key() {
        let err = Cli::try_parse_from([
            "keylink",
            "send",
            "/dev/ttyUSB0",
            "--key",
            "70000",
            "--value",
            "1",
        ])
        .expect_err("key above u16 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn log_flags_default_to_text_at_info() {
        let cli = Cli::try_parse_from(["keylink", "ports"]).expect("ports should parse");
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.log_level, LogLevel::Info);

        let cli = Cli::try_parse_from(["keylink", "ports", "--log-level", "trace", "--log-format", "json"])
            .expect("global log flags after the subcommand");
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level, LogLevel::Trace);
    }

    #[test]
    fn parses_ports_and_version() {
        let cli = Cli::try_parse_from(["keylink", "ports"]).expect("ports should parse");
        assert!(matches!(cli.command, Command::Ports(_)));

        let cli = Cli::try_parse_from(["keylink", "version", "--extended"])
            .expect("version should parse");
        assert!(matches!(cli.command, Command::Version(ref v) if v.extended));
    }
}
