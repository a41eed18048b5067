use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use proofread_core::file_parser::ParserRegistry;
use proofread_core::history::{self, HistoryLog};
use proofread_core::thesaurus::Thesaurus;
use proofread_core::{config, diff, prompt};
use proofread_core::{JsonFileStore, ProofreadSession, Proofreader, UserAction};
use proofread_types::{Correction, HistoryEntry, SessionPhase};
use tokio::sync::mpsc;

use crate::render;
use crate::{CheckArgs, ConfigAction, HistoryAction, ThesaurusAction};

async fn load_thesaurus(store: &JsonFileStore) -> Thesaurus {
    match Thesaurus::load(store).await {
        Ok(thesaurus) => thesaurus,
        Err(e) => {
            tracing::warn!(error = %e, "thesaurus: failed to load, checking without custom corrections");
            Thesaurus::default()
        }
    }
}

/// Append `entry` to the stored history. Failures are logged; the check's
/// output does not depend on them.
async fn record_history(store: &JsonFileStore, entry: HistoryEntry) -> bool {
    let mut log = match HistoryLog::load(store).await {
        Ok(log) => log,
        Err(e) => {
            tracing::warn!(error = %e, "history: failed to load, entry not recorded");
            return false;
        }
    };
    log.record(entry);
    match log.save(store).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "history: failed to save, entry not recorded");
            false
        }
    }
}

pub async fn check(store: &JsonFileStore, args: CheckArgs) -> Result<()> {
    let config = config::load(store).await;
    let thesaurus = load_thesaurus(store).await;

    let parsed = ParserRegistry::default()
        .parse_path(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    if parsed.text.trim().is_empty() {
        bail!("{} contains no text", args.file.display());
    }
    tracing::debug!(
        file = %parsed.metadata.file_name,
        chars = parsed.metadata.word_count,
        "parsed input"
    );

    let request = prompt::build_request(&config, thesaurus.enabled_corrections(), &parsed.text);
    let mut proofreader = Proofreader::from_config(&config)
        .context("model endpoint is not configured (see `proofread config set`)")?;
    let run = proofreader.start_check(ProofreadSession::new(parsed.text), request);

    let cancel = run.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    // No interactive actions; bulk operations run once the stream ends.
    let (_actions_tx, actions) = mpsc::channel::<UserAction>(1);
    let mut shown = 0;
    let mut session = run
        .run(actions, |s| {
            let found = s.board().issues().len();
            if found != shown {
                shown = found;
                eprint!("\rfound {found} issue(s)...");
            }
        })
        .await;
    if shown > 0 {
        eprintln!();
    }

    match session.phase() {
        SessionPhase::Errored => {
            let reason = session
                .error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown error".into());
            bail!("check failed: {reason}");
        }
        SessionPhase::Aborted => {
            eprintln!("check aborted, keeping {} issue(s) found so far", session.board().issues().len());
        }
        _ => {}
    }

    for filter in args.ignore {
        session.apply(UserAction::IgnoreCategory(filter));
    }
    for filter in args.fix {
        session.apply(UserAction::FixCategory(filter));
    }

    for issue in session.board().issues() {
        println!("{}", render::issue_line(issue));
    }
    for dropped in session.board().dropped() {
        tracing::debug!(original = %dropped.raw.original, reason = ?dropped.reason, "issue not located");
    }
    eprintln!("{}", render::summary_line(&session.summary()));

    if !args.no_history {
        if let Some(entry) = session.history_entry(history::timestamp_now()) {
            record_history(store, entry).await;
        }
    }

    let fixed = session.board().issues().iter().any(|i| i.is_fixed());
    match args.output {
        Some(path) => {
            tokio::fs::write(&path, session.text())
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None if fixed => {
            println!();
            println!("{}", session.text());
        }
        None => {}
    }
    Ok(())
}

pub async fn history(store: &JsonFileStore, action: HistoryAction) -> Result<()> {
    let mut log = HistoryLog::load(store).await.context("failed to load history")?;
    match action {
        HistoryAction::List => {
            if log.is_empty() {
                eprintln!("no history yet");
            }
            for entry in log.entries() {
                println!(
                    "{}  {:>3} issue(s)  {}",
                    entry.timestamp,
                    entry.issues.len(),
                    render::preview(&entry.text)
                );
            }
        }
        HistoryAction::Show { timestamp } => {
            let entry = log
                .get(&timestamp)
                .ok_or_else(|| anyhow!("no history entry at {timestamp}"))?;
            let session = ProofreadSession::restore(entry);
            println!("{}", render::annotated(session.board().document(), session.board().issues()));
            println!();
            for issue in &entry.issues {
                println!("{}", render::issue_line(issue));
            }
            println!();
            println!("{}", history::corrected_text(entry));
        }
        HistoryAction::Delete { timestamp } => {
            if !log.delete(&timestamp) {
                bail!("no history entry at {timestamp}");
            }
            log.save(store).await?;
        }
        HistoryAction::Clear => {
            let removed = log.len();
            log.clear_all();
            log.save(store).await?;
            eprintln!("removed {removed} entr{}", if removed == 1 { "y" } else { "ies" });
        }
    }
    Ok(())
}

pub async fn thesaurus(store: &JsonFileStore, action: ThesaurusAction) -> Result<()> {
    let mut thesaurus = Thesaurus::load(store).await.context("failed to load thesaurus")?;
    match action {
        ThesaurusAction::List => {
            for group in thesaurus.groups() {
                let mark = if group.enabled { "x" } else { " " };
                println!("[{mark}] {} ({})  {}", group.name, group.corrections.len(), group.id);
                for c in &group.corrections {
                    println!("      {} → {}", c.original, c.suggestion);
                }
            }
            return Ok(());
        }
        ThesaurusAction::AddGroup { name } => {
            let id = thesaurus.add_group(&name)?;
            println!("{id}");
        }
        ThesaurusAction::DeleteGroup { id } => {
            let group = thesaurus.delete_group(&id)?;
            eprintln!("deleted {} ({} correction(s))", group.name, group.corrections.len());
        }
        ThesaurusAction::Toggle { id } => {
            let enabled = thesaurus.toggle_group(&id)?;
            eprintln!("{id} {}", if enabled { "enabled" } else { "disabled" });
        }
        ThesaurusAction::Add {
            group,
            original,
            suggestion,
        } => {
            thesaurus.add_correction(&group, Correction::new(original, suggestion))?;
        }
        ThesaurusAction::Remove { group, original } => {
            thesaurus.delete_correction(&group, &original)?;
        }
    }
    thesaurus.save(store).await.context("failed to save thesaurus")?;
    Ok(())
}

fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let head: String = key.chars().take(3).collect();
    format!("{head}***")
}

pub async fn config(store: &JsonFileStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut effective = config::load(store).await;
            effective.api_key = mask_key(&effective.api_key);
            println!("{}", serde_json::to_string_pretty(&effective)?);
        }
        ConfigAction::Set {
            api_url,
            api_key,
            model,
            prompt_file,
            timeout_secs,
        } => {
            let mut stored = config::load_stored(store).await.context("failed to load config")?;
            if let Some(url) = api_url {
                stored.api_url = url;
            }
            if let Some(key) = api_key {
                stored.api_key = key;
            }
            if let Some(model) = model {
                stored.model = model;
            }
            if let Some(path) = prompt_file {
                stored.custom_prompt = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
            }
            if let Some(secs) = timeout_secs {
                stored.timeout_secs = secs;
            }
            config::save(store, &stored).await?;
            let missing = stored.missing_fields();
            if !missing.is_empty() {
                eprintln!("still missing: {}", missing.join(", "));
            }
        }
        ConfigAction::Reset => {
            config::reset(store).await?;
            eprintln!("config reset to defaults");
        }
    }
    Ok(())
}

pub async fn diff(old: &Path, new: &Path) -> Result<()> {
    let read = |path: &Path| {
        let path = path.to_path_buf();
        async move {
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let (old_text, new_text) = (read(old).await?, read(new).await?);
    let items = diff::diff(&old_text, &new_text);
    println!("{}", render::diff_markup(&items));
    eprintln!("{}", render::diff_stats_line(&diff::stats(&items)));
    Ok(())
}
