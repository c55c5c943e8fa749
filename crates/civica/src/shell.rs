// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `civica shell` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline
//! history. Bot replies print inline; grade-status changes and cooldown
//! ticks arrive from background tasks and print as they happen, the way
//! the statuses update while the user is free to keep typing.

use std::sync::Arc;

use civica_api::ApiClient;
use civica_config::CivicaConfig;
use civica_core::{
    ChatBackend, CivicaError, CooldownWindow, GradeSource, GradeStatus, Message, MessageId, Role,
};
use civica_session::{ChatSession, RetryOutcome, SendOutcome, StoreEvent};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

/// Runs the `civica shell` interactive REPL.
pub async fn run_shell(config: CivicaConfig) -> Result<(), CivicaError> {
    let api = Arc::new(ApiClient::new(&config.client)?);
    let backend: Arc<dyn ChatBackend + Send + Sync> = api.clone();
    let grades: Arc<dyn GradeSource + Send + Sync> = api;

    let session = Arc::new(ChatSession::new(&config, backend, grades));

    // Background printers: one for store events (grade badges), one for
    // the cooldown countdown banner.
    let events_task = {
        let mut events = session.store().subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StoreEvent::Patched(message)) => print_grade_change(&message),
                    Ok(StoreEvent::Appended(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "shell renderer lagged behind store events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    };
    let cooldown_task = {
        let mut updates = session.cooldown_updates();
        tokio::spawn(async move {
            let mut was_active = false;
            while updates.changed().await.is_ok() {
                let window: CooldownWindow = *updates.borrow();
                if window.active && !was_active {
                    println!(
                        "{}",
                        format!(
                            "rate limited: grading paused for {}s",
                            window.remaining_secs
                        )
                        .yellow()
                    );
                } else if !window.active && was_active {
                    println!("{}", "rate limit lifted, retries available".green());
                }
                was_active = window.active;
            }
        })
    };

    let mut rl = DefaultEditor::new()
        .map_err(|e| CivicaError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "civica shell".bold().green());
    println!(
        "Ask a civic legal question. {} to exit, {} for commands.\n",
        "/quit".yellow(),
        "/help".yellow()
    );

    let prompt = format!("{}> ", "civica".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if let Some(command) = trimmed.strip_prefix('/') {
                    handle_command(&session, command).await;
                    continue;
                }
                handle_message(&session, trimmed).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    session.shutdown().await;
    events_task.abort();
    cooldown_task.abort();
    println!("bye");
    Ok(())
}

/// Sends one chat message and prints the reply (or rejection) inline.
async fn handle_message(session: &ChatSession, text: &str) {
    match session.submitter().send(text).await {
        SendOutcome::Delivered { bot, .. } => {
            if let Some(message) = session.store().message(bot).await {
                print_bot_reply(&message);
            }
        }
        SendOutcome::Failed { bot, .. } => {
            if let Some(message) = session.store().message(bot).await {
                println!("{}", message.text.red());
            }
        }
        SendOutcome::RejectedInFlight => {
            println!("{}", "still waiting on the previous answer".yellow());
        }
        SendOutcome::RejectedCooldown => {
            let window = session.cooldown_window();
            println!(
                "{}",
                format!(
                    "rate limited: wait {}s before sending again",
                    window.remaining_secs
                )
                .yellow()
            );
        }
        SendOutcome::RejectedEmpty => {}
    }
}

/// Handles a `/command` line.
async fn handle_command(session: &ChatSession, command: &str) {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("help") => {
            println!("  /retry <id>   restart grading for a message");
            println!("  /lang <name>  set the response language");
            println!("  /status       show the transcript with grades");
            println!("  /quit         exit");
        }
        Some("retry") => match parts.next().and_then(|raw| raw.trim_start_matches('#').parse().ok())
        {
            Some(id) => print_retry_outcome(
                session.submitter().retry_grade(MessageId(id)).await,
            ),
            None => println!("usage: /retry <message-id>"),
        },
        Some("lang") => match parts.next() {
            Some(language) => {
                session.submitter().set_language(language).await;
                println!("response language set to {}", language.cyan());
            }
            None => println!("usage: /lang <language>"),
        },
        Some("status") => {
            for message in session.store().snapshot().await {
                print_transcript_line(&message);
            }
        }
        _ => println!("unknown command, try {}", "/help".yellow()),
    }
}

fn print_retry_outcome(outcome: RetryOutcome) {
    match outcome {
        RetryOutcome::Started => println!("{}", "grading restarted".green()),
        RetryOutcome::CooldownActive => {
            println!("{}", "rate-limit cooldown still active".yellow());
        }
        RetryOutcome::NotRetryable => {
            println!("that message is not waiting on a grade");
        }
        RetryOutcome::UnknownMessage => println!("no message with that id"),
    }
}

fn print_bot_reply(message: &Message) {
    println!("{}", message.text);
    if let Some(translated) = &message.translated_query {
        println!("{}", format!("(interpreted as: {translated})").dimmed());
    }
    println!("{}", format!("[{}] grading...", message.id).dimmed());
}

/// Prints a one-line badge when a message's grade changes. Intermediate
/// checking states stay on one dim line so the transcript is not flooded.
fn print_grade_change(message: &Message) {
    let Some(grade) = &message.grade else {
        return;
    };
    let badge = match grade {
        GradeStatus::Pending | GradeStatus::Checking(_) => return,
        GradeStatus::Complete { score, reason } => {
            let line = format!("[{}] graded {score}/100: {reason}", message.id);
            if *score >= 70 {
                line.green()
            } else {
                line.yellow()
            }
        }
        GradeStatus::RateLimited => {
            format!("[{}] grading paused (rate limited)", message.id).yellow()
        }
        GradeStatus::RetryAvailable => format!(
            "[{}] grade still unknown, /retry {} to try again",
            message.id, message.id.0
        )
        .cyan(),
        GradeStatus::TimedOut => format!(
            "[{}] grading timed out, /retry {} to try again",
            message.id, message.id.0
        )
        .yellow(),
        GradeStatus::GaveUp => format!(
            "[{}] grading unreachable, /retry {} to try again",
            message.id, message.id.0
        )
        .red(),
    };
    println!("{badge}");
}

fn print_transcript_line(message: &Message) {
    let speaker = match message.role {
        Role::User => "you".cyan(),
        Role::Bot => "bot".green(),
    };
    let grade = message
        .grade
        .as_ref()
        .map(|g| format!(" [{g}]"))
        .unwrap_or_default();
    println!("{} {speaker}: {}{}", message.id, message.text, grade.dimmed());
}
