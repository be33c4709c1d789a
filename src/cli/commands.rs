use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};

use super::{output, AddArgs, CheckKind, CliError, FormatArgs, ImportArgs, SearchArgs, SearchKind};
use crate::{
    align::AlignOptions,
    compose::{Overrides, TransactionComposer},
    config::{history_dir, Config},
    errors::{LedgerError, Result},
    ledger::{
        check::{check_date_order, check_syntax},
        render_entry, scan,
        scanner::block_text,
        LedgerSession,
    },
    matching::{FuzzyMatcher, Matcher},
    prompt::{Prompter, ScriptedPrompter, TerminalPrompter},
    template::TemplateStore,
    writer::LedgerWriter,
};

/// Scripted answers from the environment win over the terminal.
fn prompter_for(config: &Config) -> Box<dyn Prompter> {
    if let Some(scripted) = ScriptedPrompter::from_env() {
        tracing::debug!(remaining = scripted.remaining(), "using scripted prompts");
        return Box::new(scripted);
    }
    let history = config.history.then(history_dir);
    Box::new(TerminalPrompter::new(history))
}

/// File for an entry dated `date`, created when missing and the user agrees.
fn ensure_target(
    session: &mut LedgerSession,
    prompter: &mut dyn Prompter,
    date: NaiveDate,
    create: bool,
) -> Result<PathBuf> {
    match session.target_for(date) {
        Err(LedgerError::NoCompatibleTarget { date, path }) => {
            let question = format!("{} does not exist. Create it?", path.display());
            if create || prompter.confirm(&question, true)? {
                session.create_target(date)
            } else {
                Err(LedgerError::NoCompatibleTarget { date, path })
            }
        }
        other => other,
    }
}

pub(super) fn add(dir: &Path, args: AddArgs) -> std::result::Result<(), CliError> {
    let mut session = LedgerSession::open(dir)?;
    let template = match &args.template {
        Some(label) => {
            let store = TemplateStore::load(&session.paths().templates_file())?;
            Some(store.get(label)?.clone())
        }
        None => None,
    };
    let overrides = Overrides {
        date: args.date,
        payee: args.payee,
        narration: args.narration,
        tags: args.tags,
        incomplete: args.incomplete,
        split: args.split,
    };

    let mut prompter = prompter_for(session.config());
    let today = Local::now().date_naive();
    let draft = TransactionComposer::new(&session, prompter.as_mut(), today)?
        .compose(template.as_ref(), &overrides)?;

    let text = render_entry(&draft.entry, session.config().currency_column);
    output::section("Draft transaction");
    output::verbatim(&text);
    if args.dry_run {
        output::info("Dry run: nothing written.");
        return Ok(());
    }
    if !prompter.confirm("Commit?", true)? {
        return Err(CliError::Declined);
    }

    let date = draft.entry.date;
    let target = ensure_target(&mut session, prompter.as_mut(), date, args.create)?;
    let line = LedgerWriter::new(&target).insert_block(date, &text)?;
    output::success(format!("Entry written to {} at line {line}", target.display()));
    Ok(())
}

pub(super) fn import(dir: &Path, args: ImportArgs) -> std::result::Result<(), CliError> {
    let mut session = LedgerSession::open(dir)?;
    let contents = fs::read_to_string(&args.file)?;
    let scanned = scan(&contents, &args.file);
    for issue in &scanned.issues {
        output::warning(issue);
    }

    let mut prompter = prompter_for(session.config());
    let mut imported = 0;
    for (entry, span) in scanned.transactions() {
        let target = ensure_target(&mut session, prompter.as_mut(), entry.date, args.create)?;
        LedgerWriter::new(&target).insert_block(entry.date, &block_text(&contents, span))?;
        imported += 1;
    }
    tracing::info!(file = %args.file.display(), imported, "import finished");
    if imported == 0 {
        output::warning(format!("No transactions found in {}", args.file.display()));
    } else {
        output::success(format!("Imported {imported} transaction(s)"));
    }
    Ok(())
}

pub(super) fn search(dir: &Path, args: SearchArgs) -> std::result::Result<(), CliError> {
    let session = LedgerSession::open(dir)?;
    let config = session.config();
    let matcher = FuzzyMatcher::new(config.match_threshold);
    let limit = args.limit.unwrap_or(config.match_limit);
    let term = args.search.as_deref();

    let ranked = |population: Vec<String>| -> Vec<String> {
        matcher
            .rank(&population, term, limit)
            .into_iter()
            .map(|(value, _)| value)
            .collect()
    };
    let results = match args.kind {
        SearchKind::Templates => {
            TemplateStore::load(&session.paths().templates_file())?.search(&matcher, term, limit)
        }
        SearchKind::Accounts => ranked(session.accounts()?),
        SearchKind::Payees => ranked(session.payees()?),
        SearchKind::Narrations => ranked(session.narrations()?),
    };

    if results.is_empty() {
        output::warning("No matches");
    }
    for result in results {
        println!("{result}");
    }
    Ok(())
}

pub(super) fn format(dir: &Path, args: FormatArgs) -> std::result::Result<(), CliError> {
    let session = LedgerSession::open(dir)?;
    let mut options = AlignOptions::from_config(session.config());
    if args.auto_width {
        options.currency_column = None;
    }
    if let Some(column) = args.currency_column {
        options.currency_column = Some(column);
    }
    if let Some(width) = args.prefix_width {
        options.prefix_width = Some(width);
    }
    if let Some(width) = args.num_width {
        options.num_width = Some(width);
    }
    if let Some(width) = args.indent_width {
        options.indent_width = width;
    }

    let files = session.paths().transaction_files()?;
    if files.is_empty() {
        output::warning("No transaction files to format");
    }
    for path in files {
        if LedgerWriter::new(&path).format(&options, !args.no_backup)? {
            output::success(format!("Formatted {}", path.display()));
        } else {
            output::info(format!("{} is already aligned", path.display()));
        }
    }
    Ok(())
}

pub(super) fn check(dir: &Path, what: CheckKind) -> std::result::Result<(), CliError> {
    let session = LedgerSession::open(dir)?;
    let outcome = match what {
        CheckKind::TransactionDates => check_date_order(&session),
        CheckKind::Syntax => check_syntax(&session),
    };
    match &outcome {
        Err(LedgerError::DateOrderViolation(issues)) => {
            issues.iter().for_each(|issue| output::warning(issue));
        }
        Err(LedgerError::Syntax(issues)) => {
            issues.iter().for_each(|issue| output::warning(issue));
        }
        Err(_) => {}
        Ok(()) => output::success("No problems found"),
    }
    outcome.map_err(CliError::from)
}
