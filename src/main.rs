use std::{
    io::{
        self,
        BufRead,
        Write,
    },
    path::Path,
    process::ExitCode,
    thread,
    time::Duration,
};

use anki_ai_translator::{
    anki::AnkiConnect,
    core::{
        http::http_client,
        CancelToken,
        TranslationConfig,
    },
    persistence,
    translate::{
        prepare_provider,
        RunEvent,
        RunOutcome,
        RunPlan,
        RunSummary,
        Translator,
    },
};
use anyhow::{
    Context,
    Result,
};
use clap::Parser;
use tracing::{
    debug,
    warn,
};
use tracing_subscriber::{
    fmt,
    prelude::*,
    EnvFilter,
};

mod cli;

use cli::{
    Cli,
    Commands,
    ConfigCommand,
};

/// Exit status when the run finished but some notes failed.
const EXIT_NOTE_ERRORS: u8 = 2;
const EXIT_INTERRUPTED: i32 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.unwrap_or_else(persistence::default_config_path);
    let anki_url = cli.anki_url;
    let load = || -> Result<TranslationConfig> {
        let mut config = persistence::load_config(&config_path)?;
        if let Some(url) = &anki_url {
            config.anki_connect_url = url.clone();
        }
        Ok(config)
    };

    match cli.command {
        Commands::Translate { query } => {
            let config = load()?;
            let query = query.unwrap_or_else(|| config.batch_query_default.clone());
            translate(&config, Some(&query))
        }
        Commands::Current => translate(&load()?, None),
        Commands::Check => check(&load()?).map(|()| ExitCode::SUCCESS),
        Commands::Config(command) => {
            config_command(command, &config_path).map(|()| ExitCode::SUCCESS)
        }
    }
}

fn anki_connect(config: &TranslationConfig) -> Result<AnkiConnect> {
    let client = http_client(Duration::from_secs(config.request_timeout_secs))?;
    Ok(AnkiConnect::new(client, config.anki_connect_url.clone()))
}

fn check(config: &TranslationConfig) -> Result<()> {
    let store = anki_connect(config)?;
    let version = store
        .version()
        .with_context(|| format!("AnkiConnect is not reachable at {}", config.anki_connect_url))?;
    println!("AnkiConnect v{version} at {}", config.anki_connect_url);
    Ok(())
}

/// Batch run when `query` is given, single-card run otherwise.
fn translate(config: &TranslationConfig, query: Option<&str>) -> Result<ExitCode> {
    let provider = prepare_provider(config)?;
    let store = anki_connect(config)?;

    let cancel = CancelToken::new();
    let watched = cancel.clone();

    let mut translator = Translator::new(&store, provider.as_ref(), config)
        .with_cancel(cancel)
        .on_event(print_progress);

    // Ctrl-C keeps its default meaning at the prompt; it only turns into a
    // graceful cancel once processing starts.
    let summary = match query {
        Some(query) => {
            let mut confirm =
                arm_on_accept(prompt_confirmation, move || watch_ctrl_c(watched.clone()));
            translator.run_batch(query, &mut confirm)?
        }
        None => {
            watch_ctrl_c(watched);
            translator.run_current()?
        }
    };

    Ok(report(&summary))
}

fn print_progress(event: &RunEvent<'_>) {
    match event {
        RunEvent::NoteStarted { index, total, note_id } => {
            eprint!("[{index}/{total}] Note {note_id} ... ");
        }
        RunEvent::NoteFinished { outcome, .. } => match outcome {
            RunOutcome::Translated => eprintln!("translated"),
            RunOutcome::Skipped(reason) => eprintln!("skipped ({reason})"),
            RunOutcome::Error { kind, .. } => eprintln!("failed [{kind}]"),
        },
        RunEvent::StateChanged(state) => debug!(%state, "State changed"),
    }
}

fn prompt_confirmation(plan: &RunPlan) -> bool {
    println!("Query: {}", plan.query);
    println!("Matched notes: {}", plan.matched);
    println!("Eligible for translation: {}", plan.eligible);
    print!("Proceed? [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
    }
}

fn report(summary: &RunSummary) -> ExitCode {
    println!("{summary}");
    if !summary.has_errors() {
        return ExitCode::SUCCESS;
    }

    println!();
    println!("{}", summary.error_report());
    ExitCode::from(EXIT_NOTE_ERRORS)
}

/// Runs `on_accept` once `ask` approved the plan, before processing starts.
fn arm_on_accept(
    mut ask: impl FnMut(&RunPlan) -> bool,
    mut on_accept: impl FnMut(),
) -> impl FnMut(&RunPlan) -> bool {
    move |plan: &RunPlan| {
        let accepted = ask(plan);
        if accepted {
            on_accept();
        }
        accepted
    }
}

/// Cancels `cancel` on the first Ctrl-C; the note in flight still finishes.
/// A second Ctrl-C exits at once.
fn watch_ctrl_c(cancel: CancelToken) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            warn!("Ctrl-C handling unavailable: {e}");
            return;
        }
    };

    thread::spawn(move || {
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!("\nCancelling after the current note (Ctrl-C again to quit now)...");
            cancel.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(EXIT_INTERRUPTED);
            }
        });
    });
}

fn config_command(command: ConfigCommand, path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = persistence::load_config(path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            if let Err(e) = config.validate() {
                eprintln!("Warning: {e}");
            }
        }
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Reset => {
            if persistence::delete_data_file(path)? {
                println!("Removed {}", path.display());
            } else {
                println!("No config file at {}, defaults already apply", path.display());
            }
        }
        ConfigCommand::Set { key, value } => {
            let mut config = persistence::load_config(path)?;
            config.set_key(&key, &value)?;
            config.validate()?;
            persistence::save_config(&config, path)?;
            println!("{key} updated");
        }
    }
    Ok(())
}
