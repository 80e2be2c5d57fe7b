//! Purpose: `see` CLI entry point for the S.EE content sharing platform.
//! Role: Binary crate root; parses args, resolves settings, dispatches commands, renders output.
//! Invariants: Results go to stdout (human text or JSON with --json); diagnostics go to stderr.
//! Invariants: Errors render as text on a terminal and as one JSON object otherwise.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod config;

use config::{Settings, SettingsInput};
use see_cli::api::{DEFAULT_DOMAIN, Error, ErrorKind, to_exit_code};
use see_cli::notice::{Notice, notice_json};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    init_tracing(cli.verbose);

    let settings = Settings::from_process(SettingsInput {
        base_url: cli.base_url,
        api_key: cli.api_key,
        timeout: cli.timeout,
        json: cli.json,
    })
    .map_err(|err| (err, color_mode))?;

    command_dispatch::dispatch_command(cli.command, &settings, color_mode)
        .map_err(|err| (err, color_mode))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_env("SEE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "see",
    version,
    about = "CLI for the S.EE content sharing platform",
    long_about = None,
    after_help = r#"EXAMPLES
  $ see shorturl create https://example.com/very/long/path
  $ echo 'hello' | see text create --title greeting
  $ see file upload report.pdf screenshot.png
  $ cat build.log | see file upload --name build.log

CONFIGURATION
  SEE_API_KEY    API key (or --api-key)
  SEE_BASE_URL   API base URL (or --base-url)
  SEE_TIMEOUT    HTTP timeout in seconds (or --timeout 30s)
  SEE_LOG        Log filter, e.g. debug (or -v)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true, value_name = "URL", help = "API base URL")]
    base_url: Option<String>,
    #[arg(long, global = true, value_name = "KEY", help = "API key (or set SEE_API_KEY)")]
    api_key: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "DURATION",
        help = "HTTP timeout (e.g. 30s, 500ms)"
    )]
    timeout: Option<String>,
    #[arg(long, global = true, help = "Output in JSON format")]
    json: bool,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,
    #[arg(short, long, global = true, help = "Enable debug logging on stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List available domains")]
    Domains,
    #[command(about = "List available tags")]
    Tags,
    #[command(
        arg_required_else_help = true,
        about = "Manage short URLs",
        after_help = r#"EXAMPLES
  $ see shorturl create https://example.com --slug docs
  $ see shorturl update docs --target-url https://example.org
  $ see shorturl delete docs"#
    )]
    Shorturl {
        #[command(subcommand)]
        command: ShortUrlCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Manage text/paste entries",
        after_help = r#"EXAMPLES
  $ see text create --file notes.md --type markdown
  $ git diff | see text create --title "review"
  $ see text update abc123 --file notes.md
  $ see text delete abc123

NOTES
  - Content must be text; binary input is rejected before any request is sent"#
    )]
    Text {
        #[command(subcommand)]
        command: TextCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Manage file uploads",
        after_help = r#"EXAMPLES
  $ see file upload a.png b.pdf
  $ see file upload -f report.pdf --name q3.pdf
  $ tar cz src | see file upload --name src.tar.gz
  $ see file delete <delete-key>

NOTES
  - With several files, a failed upload is reported and the rest continue
  - A missing or unreadable file stops the whole batch
  - --name is required for stdin and cannot be combined with several files"#
    )]
    File {
        #[command(subcommand)]
        command: FileCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ see completion bash > ~/.local/share/bash-completion/completions/see
  $ see completion zsh > ~/.zfunc/_see
  $ see completion fish > ~/.config/fish/completions/see.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ShortUrlCommand {
    #[command(about = "Create a short URL")]
    Create {
        #[arg(help = "Destination URL", value_hint = ValueHint::Url)]
        target_url: String,
        #[arg(long, default_value = DEFAULT_DOMAIN, help = "Short domain")]
        domain: String,
        #[arg(long, help = "Custom slug")]
        slug: Option<String>,
        #[arg(long, help = "Title")]
        title: Option<String>,
        #[arg(long, help = "Password")]
        password: Option<String>,
        #[arg(long, value_name = "UNIX_SECONDS", help = "Expire at (unix seconds)")]
        expire_at: Option<i64>,
        #[arg(long, value_delimiter = ',', value_name = "ID,...", help = "Tag IDs")]
        tag_ids: Vec<i64>,
        #[arg(long, value_name = "URL", help = "Redirect URL after expiration")]
        expiration_redirect_url: Option<String>,
    },
    #[command(about = "Update an existing short URL")]
    Update {
        #[arg(help = "Slug of the short URL")]
        slug: String,
        #[arg(long, default_value = DEFAULT_DOMAIN, help = "Short domain")]
        domain: String,
        #[arg(long, value_name = "URL", help = "New target URL")]
        target_url: Option<String>,
        #[arg(long, help = "Title")]
        title: Option<String>,
    },
    #[command(about = "Delete a short URL")]
    Delete {
        #[arg(help = "Slug of the short URL")]
        slug: String,
        #[arg(long, default_value = DEFAULT_DOMAIN, help = "Short domain")]
        domain: String,
    },
}

#[derive(Subcommand)]
enum TextCommand {
    #[command(about = "Create a text entry (reads from --file or stdin)")]
    Create {
        #[arg(
            long,
            value_name = "PATH",
            help = "Input file path, or '-' for stdin",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
        #[arg(long, default_value = DEFAULT_DOMAIN, help = "Short domain")]
        domain: String,
        #[arg(long, help = "Custom slug")]
        slug: Option<String>,
        #[arg(long, help = "Title")]
        title: Option<String>,
        #[arg(long = "type", value_name = "TYPE", help = "Syntax highlighting type")]
        text_type: Option<String>,
        #[arg(long, help = "Password")]
        password: Option<String>,
        #[arg(long, value_name = "UNIX_SECONDS", help = "Expire at (unix seconds)")]
        expire_at: Option<i64>,
        #[arg(long, value_delimiter = ',', value_name = "ID,...", help = "Tag IDs")]
        tag_ids: Vec<i64>,
    },
    #[command(about = "Update a text entry (reads from --file or stdin)")]
    Update {
        #[arg(help = "Slug of the text entry")]
        slug: String,
        #[arg(
            long,
            value_name = "PATH",
            help = "Input file path, or '-' for stdin",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
        #[arg(long, default_value = DEFAULT_DOMAIN, help = "Short domain")]
        domain: String,
        #[arg(long, help = "Title")]
        title: Option<String>,
    },
    #[command(about = "Delete a text entry")]
    Delete {
        #[arg(help = "Slug of the text entry")]
        slug: String,
        #[arg(long, default_value = DEFAULT_DOMAIN, help = "Short domain")]
        domain: String,
    },
}

#[derive(Subcommand)]
enum FileCommand {
    #[command(about = "Upload one or more files")]
    Upload {
        #[arg(help = "Files to upload", value_hint = ValueHint::FilePath)]
        files: Vec<String>,
        #[arg(
            short = 'f',
            long,
            value_name = "PATH",
            help = "Path to file to upload (default stdin if not provided or -)",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
        #[arg(
            short = 'n',
            long,
            help = "Filename to use (required for stdin, optional override for one file)"
        )]
        name: Option<String>,
    },
    #[command(about = "Delete one or more files")]
    Delete {
        #[arg(required = true, help = "Delete keys returned by upload")]
        keys: Vec<String>,
    },
    #[command(about = "List available file domains")]
    Domains,
}

fn emit_json(value: &Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn to_json_value<T: serde::Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output json")
            .with_source(err)
    })
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        if notice.item.is_empty() {
            eprintln!("{label} {}", notice.message);
        } else {
            eprintln!("{label} {}: {}", notice.item, notice.message);
        }
        return;
    }

    let json = serde_json::to_string(&notice_json(notice)).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::MissingFilename => "missing filename".to_string(),
        ErrorKind::ConflictingName => "conflicting name".to_string(),
        ErrorKind::FileOpen => "failed to open file".to_string(),
        ErrorKind::EmptyContent => "content is empty".to_string(),
        ErrorKind::NonTextContent => "non-text content".to_string(),
        ErrorKind::Remote => "remote request failed".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(name) = err.name() {
        inner.insert("name".to_string(), json!(name));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(media_type) = err.media_type() {
        inner.insert("media_type".to_string(), json!(media_type));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    )];
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(name) = err.name() {
        lines.push(format!(
            "{} {name}",
            colorize_label("name:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(media_type) = err.media_type() {
        lines.push(format!(
            "{} {media_type}",
            colorize_label("media type:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);
    let Some(usage) = usage else {
        return "Try `see --help`.".to_string();
    };

    let parts: Vec<&str> = usage
        .split_whitespace()
        .skip_while(|token| *token != "see")
        .skip(1)
        .take_while(|token| {
            !token.starts_with('-') && !token.starts_with('<') && !token.starts_with('[')
        })
        .collect();
    if parts.is_empty() {
        return "Try `see --help`.".to_string();
    }
    format!("Try `see {} --help`.", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, FileCommand, TextCommand, error_json, error_text};
    use clap::{CommandFactory, Parser};
    use see_cli::api::{Error, ErrorKind};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn upload_accepts_positional_and_flag_inputs() {
        let cli = Cli::try_parse_from(["see", "file", "upload", "a.txt", "b.txt", "-f", "c.txt"])
            .expect("parse");
        match cli.command {
            Command::File {
                command: FileCommand::Upload { files, file, name },
            } => {
                assert_eq!(files, ["a.txt", "b.txt"]);
                assert_eq!(file.as_deref(), Some("c.txt"));
                assert!(name.is_none());
            }
            _ => panic!("expected file upload"),
        }
    }

    #[test]
    fn upload_accepts_stdin_marker_positional() {
        let cli = Cli::try_parse_from(["see", "file", "upload", "-", "--name", "x.bin"])
            .expect("parse");
        match cli.command {
            Command::File {
                command: FileCommand::Upload { files, name, .. },
            } => {
                assert_eq!(files, ["-"]);
                assert_eq!(name.as_deref(), Some("x.bin"));
            }
            _ => panic!("expected file upload"),
        }
    }

    #[test]
    fn text_create_parses_tag_ids_and_type() {
        let cli = Cli::try_parse_from([
            "see", "text", "create", "--type", "rust", "--tag-ids", "1,2", "--json",
        ])
        .expect("parse");
        assert!(cli.json);
        match cli.command {
            Command::Text {
                command:
                    TextCommand::Create {
                        text_type,
                        tag_ids,
                        domain,
                        file,
                        ..
                    },
            } => {
                assert_eq!(text_type.as_deref(), Some("rust"));
                assert_eq!(tag_ids, [1, 2]);
                assert_eq!(domain, "s.ee");
                assert!(file.is_none());
            }
            _ => panic!("expected text create"),
        }
    }

    #[test]
    fn file_delete_requires_a_key() {
        assert!(Cli::try_parse_from(["see", "file", "delete"]).is_err());
        assert!(Cli::try_parse_from(["see", "file", "delete", "k1", "k2"]).is_ok());
    }

    #[test]
    fn error_json_carries_media_type() {
        let err = Error::new(ErrorKind::NonTextContent)
            .with_message("non-text content detected (image/png); only text input is allowed")
            .with_media_type("image/png");
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "NonTextContent");
        assert_eq!(value["error"]["media_type"], "image/png");
    }

    #[test]
    fn error_text_without_color_is_plain() {
        let err = Error::new(ErrorKind::MissingFilename)
            .with_message("filename must be provided via --name when reading from stdin");
        assert_eq!(
            error_text(&err, false),
            "error: filename must be provided via --name when reading from stdin"
        );
    }
}
