// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao inbox` command implementation.
//!
//! Launches the interactive inbox REPL: list, search, open, reply, and
//! manage conversations with slash commands. All state goes through the
//! engine, so caches, debounce, and invalidation behave exactly as they
//! do for any other frontend; the REPL only renders.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use balcao_config::model::InboxConfig;
use balcao_core::types::{
    Agent, Conversation, ConversationDetail, Direction, Message, MessageKind, MessageStatus,
};
use balcao_core::{Backend, BalcaoError};
use balcao_inbox::{EngineUpdate, InboxEngine, InboxFilter, MutationKind, OutboundEntry};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use strum::IntoEnumIterator;
use uuid::Uuid;

/// How long a command waits for its spawned mutations to settle before
/// giving the prompt back. Late settles print with the next command.
const SETTLE_WAIT: Duration = Duration::from_millis(1500);

/// Runs the `balcao inbox` interactive REPL.
pub async fn run_inbox(
    backend: Arc<dyn Backend>,
    agent: Agent,
    config: &InboxConfig,
    filter: Option<String>,
    search: Option<String>,
) -> Result<(), BalcaoError> {
    let mut engine = InboxEngine::new(backend, agent, config);

    if let Some(name) = filter {
        engine.set_filter(parse_filter(&name)?).await?;
    }
    if let Some(term) = search {
        engine.type_search(&term);
        wait_for_search(&mut engine).await?;
    }

    println!("{}", "balcao inbox".bold().green());
    println!(
        "Type {} for commands, {} to exit.\n",
        "/help".yellow(),
        "/quit".yellow()
    );

    render_list(&mut engine).await?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| BalcaoError::Internal(format!("failed to initialize readline: {e}")))?;

    let prompt = format!("{}> ", "balcao".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match handle_command(&mut engine, trimmed).await {
                    Ok(()) => {}
                    // A rejected token will not recover without a new login.
                    Err(e) if e.is_auth() => return Err(e),
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    Ok(())
}

/// Executes one REPL line. Anything that is not a slash command is a
/// search term.
async fn handle_command(engine: &mut InboxEngine, line: &str) -> Result<(), BalcaoError> {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "/help" => print_help(),
        "/list" => render_list(engine).await?,
        "/filter" => {
            engine.set_filter(parse_filter(rest)?).await?;
            render_list(engine).await?;
        }
        "/page" => {
            let page: u32 = rest
                .parse()
                .map_err(|_| BalcaoError::Validation("usage: /page <number>".to_string()))?;
            engine.set_page(page).await?;
            render_list(engine).await?;
        }
        "/next" => {
            let page = engine.page() + 1;
            engine.set_page(page).await?;
            render_list(engine).await?;
        }
        "/prev" => {
            let page = engine.page().saturating_sub(1);
            engine.set_page(page).await?;
            render_list(engine).await?;
        }
        "/counts" => {
            let counts = engine.counts().await?;
            println!(
                "  unassigned {}  in-progress {}  mine {}  archived {}",
                counts.unassigned, counts.in_progress, counts.mine, counts.archived
            );
        }
        "/open" => {
            let index: usize = rest
                .parse()
                .map_err(|_| BalcaoError::Validation("usage: /open <row>".to_string()))?;
            let conversation_id = row_id(engine, index).await?;
            engine.select(conversation_id).await?;
            drain_settles(engine).await?;
            render_detail(engine, conversation_id).await?;
        }
        "/show" => {
            let conversation_id = selection(engine)?;
            render_detail(engine, conversation_id).await?;
        }
        "/back" => {
            engine.clear_selection();
            render_list(engine).await?;
        }
        "/reply" => {
            if rest.is_empty() {
                return Err(BalcaoError::Validation("usage: /reply <text>".to_string()));
            }
            let conversation_id = selection(engine)?;
            engine.set_draft(rest);
            engine.send_draft()?;
            drain_settles(engine).await?;
            render_detail(engine, conversation_id).await?;
        }
        "/draft" => {
            if rest.is_empty() {
                let draft = engine.draft();
                if draft.is_empty() {
                    println!("  draft is empty");
                } else {
                    println!("  draft: {draft}");
                }
            } else {
                engine.set_draft(rest);
                println!("  draft: {rest}");
            }
        }
        "/send" => {
            let conversation_id = selection(engine)?;
            engine.send_draft()?;
            drain_settles(engine).await?;
            render_detail(engine, conversation_id).await?;
        }
        "/template" => {
            let templates = engine.templates().await?;
            if rest.is_empty() {
                print_templates(&templates);
            } else {
                apply_template(engine, &templates, rest)?;
                println!("  draft: {}", engine.draft());
            }
        }
        "/outbox" => {
            let conversation_id = selection(engine)?;
            let entries: Vec<OutboundEntry> = engine
                .outbox_for(conversation_id)
                .into_iter()
                .cloned()
                .collect();
            if entries.is_empty() {
                println!("  outbox is empty");
            }
            for (i, entry) in entries.iter().enumerate() {
                println!("{}", render_outbox_entry(i + 1, entry));
            }
        }
        "/resend" => {
            let conversation_id = selection(engine)?;
            let index: usize = rest
                .parse()
                .map_err(|_| BalcaoError::Validation("usage: /resend <entry>".to_string()))?;
            let local_id = {
                let entries = engine.outbox_for(conversation_id);
                index
                    .checked_sub(1)
                    .and_then(|i| entries.get(i))
                    .map(|entry| entry.local_id)
                    .ok_or_else(|| {
                        BalcaoError::Validation(format!(
                            "no outbox entry {index}; /outbox lists them"
                        ))
                    })?
            };
            engine.resend(local_id)?;
            drain_settles(engine).await?;
            render_detail(engine, conversation_id).await?;
        }
        "/assign" => {
            let conversation_id = selection(engine)?;
            engine.assign_to_self(conversation_id);
            drain_settles(engine).await?;
            render_list(engine).await?;
        }
        "/unassign" => {
            let conversation_id = selection(engine)?;
            engine.unassign(conversation_id);
            drain_settles(engine).await?;
            render_list(engine).await?;
        }
        "/delegate" => {
            let conversation_id = selection(engine)?;
            let targets = engine.delegation_targets().await?;
            if rest.is_empty() {
                print_agents(&targets);
            } else {
                let target = resolve_agent(&targets, rest)?;
                engine.delegate(conversation_id, target).await?;
                drain_settles(engine).await?;
                render_list(engine).await?;
            }
        }
        "/archive" => {
            let conversation_id = selection(engine)?;
            engine.toggle_archive(conversation_id);
            drain_settles(engine).await?;
            render_list(engine).await?;
        }
        "/pin" => {
            let conversation_id = selection(engine)?;
            engine.toggle_pin(conversation_id);
            drain_settles(engine).await?;
            render_list(engine).await?;
        }
        "/ai" => {
            let conversation_id = selection(engine)?;
            engine.toggle_ai(conversation_id);
            drain_settles(engine).await?;
            render_detail(engine, conversation_id).await?;
        }
        "/note" => {
            let conversation_id = selection(engine)?;
            engine.create_note(conversation_id, rest)?;
            drain_settles(engine).await?;
            render_detail(engine, conversation_id).await?;
        }
        "/search" => {
            engine.type_search(rest);
            wait_for_search(engine).await?;
            render_list(engine).await?;
        }
        other if !other.starts_with('/') => {
            engine.type_search(line);
            wait_for_search(engine).await?;
            render_list(engine).await?;
        }
        other => {
            return Err(BalcaoError::Validation(format!(
                "unknown command {other}; /help lists commands"
            )));
        }
    }

    Ok(())
}

/// Waits for spawned mutations to settle and prints each outcome. Quiet
/// mark-read successes are skipped; everything else is reported.
async fn drain_settles(engine: &mut InboxEngine) -> Result<(), BalcaoError> {
    while engine.pending().any() {
        match tokio::time::timeout(SETTLE_WAIT, engine.next_update()).await {
            Ok(Ok(EngineUpdate::MutationSettled { kind, error, .. })) => match error {
                Some(error) => println!("  {} {kind}: {error}", "✗".red()),
                None if kind == MutationKind::MarkRead => {}
                None => println!("  {} {kind}", "✓".green()),
            },
            Ok(Ok(EngineUpdate::SearchApplied { .. })) => {}
            Ok(Err(e)) => return Err(e),
            // Still in flight; the outcome prints with the next command.
            Err(_) => break,
        }
    }
    Ok(())
}

/// Pumps the engine until the queued search term commits.
async fn wait_for_search(engine: &mut InboxEngine) -> Result<(), BalcaoError> {
    loop {
        match engine.next_update().await? {
            EngineUpdate::SearchApplied { .. } => return Ok(()),
            EngineUpdate::MutationSettled {
                kind,
                error: Some(error),
                ..
            } => {
                println!("  {} {kind}: {error}", "✗".red());
            }
            EngineUpdate::MutationSettled { .. } => {}
        }
    }
}

fn selection(engine: &InboxEngine) -> Result<Uuid, BalcaoError> {
    engine.selected().ok_or_else(|| {
        BalcaoError::Validation("no conversation open; use /open <row>".to_string())
    })
}

/// Maps a 1-based row number on the current page to its conversation.
async fn row_id(engine: &mut InboxEngine, index: usize) -> Result<Uuid, BalcaoError> {
    let page = engine.list().await?;
    let len = page.conversations.len();
    if len == 0 {
        return Err(BalcaoError::Validation("the list is empty".to_string()));
    }
    if index == 0 || index > len {
        return Err(BalcaoError::Validation(format!(
            "row {index} is not on this page (1-{len})"
        )));
    }
    Ok(page.conversations[index - 1].id)
}

/// Parses a category name, listing the valid ones on failure.
fn parse_filter(name: &str) -> Result<InboxFilter, BalcaoError> {
    name.parse::<InboxFilter>().map_err(|_| {
        let known: Vec<String> = InboxFilter::iter().map(|f| f.to_string()).collect();
        BalcaoError::Validation(format!(
            "unknown category `{name}`; expected one of: {}",
            known.join(", ")
        ))
    })
}

fn resolve_agent(agents: &[Agent], wanted: &str) -> Result<Uuid, BalcaoError> {
    if let Ok(index) = wanted.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| agents.get(i))
            .map(|a| a.id)
            .ok_or_else(|| {
                BalcaoError::Validation(format!("no agent {wanted}; /delegate lists them"))
            });
    }
    agents
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(wanted))
        .map(|a| a.id)
        .ok_or_else(|| {
            BalcaoError::Validation(format!(
                "no agent named `{wanted}`; /delegate lists them"
            ))
        })
}

/// Renders a template into the draft. `spec` is `<n> [name=value ...]`.
fn apply_template(
    engine: &mut InboxEngine,
    templates: &[balcao_core::types::MessageTemplate],
    spec: &str,
) -> Result<(), BalcaoError> {
    let mut parts = spec.split_whitespace();
    let index: usize = parts
        .next()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| {
            BalcaoError::Validation("usage: /template <n> [name=value ...]".to_string())
        })?;
    let template = index
        .checked_sub(1)
        .and_then(|i| templates.get(i))
        .ok_or_else(|| {
            BalcaoError::Validation(format!("no template {index}; /template lists them"))
        })?;

    let mut values = HashMap::new();
    for pair in parts {
        let (name, value) = pair.split_once('=').ok_or_else(|| {
            BalcaoError::Validation(format!("expected name=value, got `{pair}`"))
        })?;
        values.insert(name.to_string(), value.to_string());
    }

    engine.apply_template(template, &values)
}

// --- Rendering ---

async fn render_list(engine: &mut InboxEngine) -> Result<(), BalcaoError> {
    let page = engine.list().await?.clone();
    let filter = engine.filter();
    let page_no = engine.page();
    let search = engine.search_term().map(str::to_string);
    let selected = engine.selected();

    println!();
    match &search {
        Some(term) => println!("  {} (page {page_no}, search \"{term}\")", filter.to_string().bold()),
        None => println!("  {} (page {page_no})", filter.to_string().bold()),
    }
    println!("  {}", "-".repeat(64));

    if page.conversations.is_empty() {
        println!("  nothing here");
    }
    for (i, conversation) in page.conversations.iter().enumerate() {
        println!("{}", render_row(i + 1, conversation, selected));
    }

    let pagination = page.pagination;
    if pagination.total_pages > 1 {
        println!(
            "  page {} of {} ({} conversations)",
            pagination.page, pagination.total_pages, pagination.total
        );
    }
    println!();
    Ok(())
}

/// One list row: marker, row number, customer, preview, badges, time.
fn render_row(index: usize, conversation: &Conversation, selected: Option<Uuid>) -> String {
    let marker = if selected == Some(conversation.id) {
        ">"
    } else {
        " "
    };
    let name = conversation
        .customer
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("unknown");
    let preview = conversation
        .last_message
        .as_deref()
        .unwrap_or("")
        .replace(['\n', '\r'], " ");

    let mut badges = String::new();
    if conversation.is_pinned {
        badges.push('*');
    }
    if conversation.unread_count > 0 {
        badges.push_str(&format!(" ({})", conversation.unread_count));
    }

    let when = conversation
        .last_message_at
        .map(fmt_time)
        .unwrap_or_default();

    format!(
        "  {marker} {index:>2}  {:<20} {:<38}{badges:<6} {when}",
        truncate_chars(name, 20),
        truncate_chars(&preview, 38),
    )
}

async fn render_detail(
    engine: &mut InboxEngine,
    conversation_id: Uuid,
) -> Result<(), BalcaoError> {
    let detail = engine.detail(conversation_id).await?.clone();
    let outbox: Vec<OutboundEntry> = engine
        .outbox_for(conversation_id)
        .into_iter()
        .cloned()
        .collect();
    print_detail(&detail, &outbox);
    Ok(())
}

fn print_detail(detail: &ConversationDetail, outbox: &[OutboundEntry]) {
    let conversation = &detail.conversation;
    let name = conversation
        .customer
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("unknown");
    let phone = conversation
        .customer
        .as_ref()
        .and_then(|c| c.phone.as_deref())
        .unwrap_or("");

    println!();
    println!("  {} {}", name.bold(), phone.dimmed());

    let mut badges: Vec<String> = Vec::new();
    match (&conversation.assigned_agent, conversation.assigned_agent_id) {
        (Some(agent), _) => badges.push(format!("assigned: {}", agent.name)),
        (None, Some(_)) => badges.push("assigned".to_string()),
        (None, None) => badges.push("unassigned".to_string()),
    }
    if let Some(channel) = &conversation.channel {
        badges.push(format!("channel: {}", channel.name));
    }
    if conversation.is_archived {
        badges.push("archived".to_string());
    }
    if conversation.is_pinned {
        badges.push("pinned".to_string());
    }
    badges.push(if conversation.ai_enabled {
        "ai: on".to_string()
    } else {
        "ai: off".to_string()
    });
    println!("  {}", badges.join(" | "));
    println!("  {}", "-".repeat(64));

    if detail.messages.is_empty() {
        println!("  no messages yet");
    }
    for message in &detail.messages {
        println!("{}", render_message(message));
    }

    if !outbox.is_empty() {
        println!();
        println!("  outbox:");
        for (i, entry) in outbox.iter().enumerate() {
            println!("{}", render_outbox_entry(i + 1, entry));
        }
    }
    println!();
}

fn render_message(message: &Message) -> String {
    let when = message.created_at.map(fmt_time).unwrap_or_default();
    let body = match message.kind {
        MessageKind::Text => {
            truncate_chars(&message.content.replace(['\n', '\r'], " "), 70)
        }
        other => {
            let filename = message.filename.as_deref().unwrap_or("");
            format!("[{other}] {filename}")
        }
    };

    if message.is_note || message.direction == Direction::Note {
        return format!("      {} {body}", "note:".yellow());
    }

    let arrow = match message.direction {
        Direction::In => "<".cyan().to_string(),
        _ => ">".green().to_string(),
    };
    let failed = if message.direction != Direction::In
        && message.status == MessageStatus::Failed
    {
        format!(" {}", "[failed]".red())
    } else {
        String::new()
    };

    format!("    {arrow} {body}{failed}  {}", when.dimmed())
}

fn render_outbox_entry(index: usize, entry: &OutboundEntry) -> String {
    let status = match entry.status {
        MessageStatus::Failed => format!(
            "failed: {}",
            entry.error.as_deref().unwrap_or("unknown error")
        ),
        MessageStatus::Sending => "sending".to_string(),
        _ => "sent".to_string(),
    };
    format!(
        "    {index:>2}  \"{}\" ({status})",
        truncate_chars(&entry.content, 40)
    )
}

fn print_agents(agents: &[Agent]) {
    if agents.is_empty() {
        println!("  no other agents in this tenant");
        return;
    }
    println!();
    for (i, agent) in agents.iter().enumerate() {
        println!("    {:>2}  {:<24} {}", i + 1, agent.name, agent.role);
    }
    println!();
}

fn print_templates(templates: &[balcao_core::types::MessageTemplate]) {
    if templates.is_empty() {
        println!("  no templates configured");
        return;
    }
    println!();
    for (i, template) in templates.iter().enumerate() {
        let variables = template.variable_names();
        if variables.is_empty() {
            println!("    {:>2}  {}", i + 1, template.title);
        } else {
            println!(
                "    {:>2}  {} (variables: {})",
                i + 1,
                template.title,
                variables.join(", ")
            );
        }
    }
    println!();
}

fn print_help() {
    println!();
    println!("  /list                    show the current page");
    println!("  /filter <category>       unassigned | in-progress | mine | archived");
    println!("  /page <n>, /next, /prev  move between pages");
    println!("  /counts                  category tallies");
    println!("  /open <row>              open a conversation");
    println!("  /show, /back             re-render or leave the open conversation");
    println!("  /reply <text>            send a message to the open conversation");
    println!("  /draft [text], /send     stage a draft, send it");
    println!("  /template [n name=v ..]  list templates or render one into the draft");
    println!("  /outbox, /resend <n>     failed sends and their recovery");
    println!("  /assign, /unassign       take or release the open conversation");
    println!("  /delegate [agent]        hand the open conversation to another agent");
    println!("  /archive, /pin, /ai      toggle flags on the open conversation");
    println!("  /note <text>             add an internal note");
    println!("  <anything else>          search the inbox; bare /search clears it");
    println!("  /quit");
    println!();
}

/// Truncates to `max` characters with an ellipsis, never splitting a
/// multi-byte character.
fn truncate_chars(text: &str, max: usize) -> String {
    let mut out = String::new();
    for (i, c) in text.chars().enumerate() {
        if i == max {
            out.push('…');
            return out;
        }
        out.push(c);
    }
    out
}

/// Short local-time stamp: clock for today, day/month otherwise.
fn fmt_time(at: DateTime<Utc>) -> String {
    let local = at.with_timezone(&Local);
    if local.date_naive() == Local::now().date_naive() {
        local.format("%H:%M").to_string()
    } else {
        local.format("%d/%m").to_string()
    }
}
