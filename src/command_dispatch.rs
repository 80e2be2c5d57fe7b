//! Purpose: Hold top-level CLI command dispatch for `see`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Input resolution and content validation finish before any request is sent.
//! Invariants: A batch upload reports every item; the exit code is the first failure's.

use super::*;

use clap::CommandFactory;
use see_cli::api::{
    Ack, CreateShortUrlRequest, CreateTextRequest, SeeClient, ShortLink, SlugRef,
    UpdateShortUrlRequest, UpdateTextRequest, UploadedFile,
};
use see_cli::core::ingest::{ItemOutcome, read_text, upload_batch};
use see_cli::core::sniff::DefaultSniffer;
use see_cli::core::source::{SourceSpec, StdinInput};
use see_cli::notice::notice_time_now;

pub(super) fn dispatch_command(
    command: Command,
    settings: &Settings,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "see", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Domains => {
            let domains = connect(settings)?.domains()?;
            emit_list(settings, "domains", &domains, |domain| domain.clone())?;
            Ok(RunOutcome::ok())
        }
        Command::Tags => {
            let tags = connect(settings)?.tags()?;
            emit_list(settings, "tags", &tags, |tag| {
                format!("{}\t{}", tag.id, tag.name)
            })?;
            Ok(RunOutcome::ok())
        }
        Command::Shorturl { command } => dispatch_short_url(command, settings),
        Command::Text { command } => dispatch_text(command, settings),
        Command::File { command } => dispatch_file(command, settings, color_mode),
    }
}

fn connect(settings: &Settings) -> Result<SeeClient, Error> {
    SeeClient::new(settings.client_config()?)
}

fn dispatch_short_url(command: ShortUrlCommand, settings: &Settings) -> Result<RunOutcome, Error> {
    match command {
        ShortUrlCommand::Create {
            target_url,
            domain,
            slug,
            title,
            password,
            expire_at,
            tag_ids,
            expiration_redirect_url,
        } => {
            let request = CreateShortUrlRequest {
                target_url,
                domain,
                custom_slug: slug,
                title,
                password,
                expire_at,
                tag_ids,
                expiration_redirect_url,
            };
            let link = connect(settings)?.create_short_url(&request)?;
            emit_short_link(settings, &link)?;
            Ok(RunOutcome::ok())
        }
        ShortUrlCommand::Update {
            slug,
            domain,
            target_url,
            title,
        } => {
            let Some(target_url) = target_url.filter(|url| !url.trim().is_empty()) else {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--target-url is required")
                    .with_hint("Use `see shorturl update <slug> --target-url <url>`."));
            };
            let request = UpdateShortUrlRequest {
                domain,
                slug,
                target_url,
                title,
            };
            let ack = connect(settings)?.update_short_url(&request)?;
            emit_ack(settings, &ack, "Short URL updated successfully")?;
            Ok(RunOutcome::ok())
        }
        ShortUrlCommand::Delete { slug, domain } => {
            let ack = connect(settings)?.delete_short_url(&SlugRef { domain, slug })?;
            emit_ack(settings, &ack, "Short URL deleted successfully")?;
            Ok(RunOutcome::ok())
        }
    }
}

fn dispatch_text(command: TextCommand, settings: &Settings) -> Result<RunOutcome, Error> {
    match command {
        TextCommand::Create {
            file,
            domain,
            slug,
            title,
            text_type,
            password,
            expire_at,
            tag_ids,
        } => {
            let content = read_text(
                file.as_deref(),
                &mut StdinInput::from_process(),
                &DefaultSniffer,
            )?;
            let request = CreateTextRequest {
                content,
                domain,
                custom_slug: slug,
                title,
                text_type,
                password,
                expire_at,
                tag_ids,
            };
            let link = connect(settings)?.create_text(&request)?;
            emit_short_link(settings, &link)?;
            Ok(RunOutcome::ok())
        }
        TextCommand::Update {
            slug,
            file,
            domain,
            title,
        } => {
            let content = read_text(
                file.as_deref(),
                &mut StdinInput::from_process(),
                &DefaultSniffer,
            )?;
            let request = UpdateTextRequest {
                domain,
                slug,
                content,
                title,
            };
            let ack = connect(settings)?.update_text(&request)?;
            emit_ack(settings, &ack, "Text updated successfully")?;
            Ok(RunOutcome::ok())
        }
        TextCommand::Delete { slug, domain } => {
            let ack = connect(settings)?.delete_text(&SlugRef { domain, slug })?;
            emit_ack(settings, &ack, "Text deleted successfully")?;
            Ok(RunOutcome::ok())
        }
    }
}

fn dispatch_file(
    command: FileCommand,
    settings: &Settings,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        FileCommand::Upload { files, file, name } => {
            let plan = SourceSpec::new(files, file, name).plan()?;
            let client = connect(settings)?;
            let batch = plan.is_batch();

            let mut emit_failure: Result<(), Error> = Ok(());
            let report = upload_batch(
                &plan,
                &mut StdinInput::from_process(),
                |item| client.upload_file(&item.name, &item.bytes),
                |outcome| match &outcome.result {
                    Ok(uploaded) => {
                        if emit_failure.is_ok() {
                            emit_failure = emit_uploaded(settings, &outcome.name, uploaded);
                        }
                    }
                    Err(err) if batch => emit_upload_failure(outcome, err, color_mode),
                    Err(_) => {}
                },
                |index| emit_skipped_marker(index, color_mode),
            )?;
            emit_failure?;

            if !batch {
                if let Some(outcome) = report.outcomes.into_iter().next() {
                    outcome.result?;
                }
                return Ok(RunOutcome::ok());
            }
            tracing::debug!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                skipped = report.skipped,
                "upload batch finished"
            );
            Ok(match report.first_failure() {
                Some(err) => RunOutcome::with_code(to_exit_code(err.kind())),
                None => RunOutcome::ok(),
            })
        }
        FileCommand::Delete { keys } => {
            let client = connect(settings)?;
            for key in keys {
                let ack = client.delete_file(&key)?;
                if settings.json {
                    emit_json(&to_json_value(&ack)?);
                } else {
                    println!("File with key \"{key}\" deleted successfully");
                }
            }
            Ok(RunOutcome::ok())
        }
        FileCommand::Domains => {
            let domains = connect(settings)?.file_domains()?;
            emit_list(settings, "domains", &domains, |domain| domain.clone())?;
            Ok(RunOutcome::ok())
        }
    }
}

fn emit_list<T, F>(settings: &Settings, key: &str, items: &[T], line: F) -> Result<(), Error>
where
    T: serde::Serialize,
    F: Fn(&T) -> String,
{
    if settings.json {
        emit_json(&json!({ key: to_json_value(&items)? }));
        return Ok(());
    }
    for item in items {
        println!("{}", line(item));
    }
    Ok(())
}

fn emit_short_link(settings: &Settings, link: &ShortLink) -> Result<(), Error> {
    if settings.json {
        emit_json(&to_json_value(link)?);
    } else {
        println!("{}", link.short_url);
    }
    Ok(())
}

fn emit_ack(settings: &Settings, ack: &Ack, fallback: &str) -> Result<(), Error> {
    if settings.json {
        emit_json(&to_json_value(ack)?);
    } else if ack.message.trim().is_empty() {
        println!("{fallback}");
    } else {
        println!("{}", ack.message);
    }
    Ok(())
}

fn emit_uploaded(settings: &Settings, name: &str, uploaded: &UploadedFile) -> Result<(), Error> {
    if settings.json {
        // One line per item so batch output stays JSON Lines.
        let line = serde_json::to_string(uploaded).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode output json")
                .with_source(err)
        })?;
        println!("{line}");
        return Ok(());
    }
    println!("File uploaded successfully: {name}");
    println!("URL: {}", uploaded.url);
    println!("Delete Key: {}", uploaded.delete);
    println!("Page: {}", uploaded.page);
    println!("---");
    Ok(())
}

fn emit_upload_failure<T>(outcome: &ItemOutcome<T>, err: &Error, color_mode: ColorMode) {
    let mut details = Map::new();
    details.insert("index".to_string(), json!(outcome.index));
    details.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    if let Some(status) = err.status() {
        details.insert("status".to_string(), json!(status));
    }
    emit_notice(
        &Notice {
            kind: "upload_failed".to_string(),
            time: notice_time_now().unwrap_or_default(),
            cmd: "file upload".to_string(),
            item: outcome.name.clone(),
            message: error_message(err),
            details,
        },
        color_mode,
    );
}

fn emit_skipped_marker(index: usize, color_mode: ColorMode) {
    let mut details = Map::new();
    details.insert("index".to_string(), json!(index));
    emit_notice(
        &Notice {
            kind: "skipped_stdin_marker".to_string(),
            time: notice_time_now().unwrap_or_default(),
            cmd: "file upload".to_string(),
            item: String::new(),
            message: "'-' is ignored when uploading several files; pipe stdin as a single upload"
                .to_string(),
            details,
        },
        color_mode,
    );
}
