mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use newsdesk::prelude::*;
use newsdesk::notify::LogNotifier;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsdesk=info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.base_url { settings.base_url = Some(url); }
    if let Some(dir) = cli.data_dir { settings.data_dir = Some(dir); }
    let desk = Newsdesk::connect(settings)?;

    match cli.command {
        Commands::Kinds => {
            for kind in ContentKind::ALL {
                let e = desk.settings().endpoints(kind);
                let featured = if kind.has_featured() { " (featured)" } else { "" };
                println!("{:<12} {:<14} read={} write={}{}", kind.slug(), kind.label(), e.read, e.write, featured);
            }
        }
        Commands::Render { kind, featured } => {
            let page = Arc::new(MemoryContainer::with_placeholder(Fragment::raw("<p class=\"loading\">Cargando…</p>")));
            let outcome = desk.loader(kind, featured, page.clone()).render().await;
            println!("{}", page.html());
            if outcome == RenderOutcome::Failed { return Ok(ExitCode::FAILURE); }
        }
        Commands::List { kind } => {
            let editor = list_editor(&desk, kind);
            let count = editor.try_load().await?;
            let fields = kind.fields();
            for row in editor.rows() {
                let values: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}={:?}", f.name, row.value(&f.name).unwrap_or("")))
                    .collect();
                println!("{} {}", row.key(), values.join(" "));
            }
            eprintln!("{count} {} rows", kind.slug());
        }
        Commands::Check { kind } => {
            let editor = list_editor(&desk, kind);
            editor.try_load().await?;
            let (valid, rejected) = editor.payload();
            for row in editor.rows().iter().filter(|r| rejected.contains(&r.key())) {
                println!("{} missing: {}", row.key(), row.missing_fields().join(", "));
            }
            println!("{} valid, {} would be dropped", valid.len(), rejected.len());
            if !rejected.is_empty() { return Ok(ExitCode::FAILURE); }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn list_editor(desk: &Newsdesk, kind: ContentKind) -> ListEditor {
    desk.editor(kind, Arc::new(MemoryContainer::new()), Arc::new(LogNotifier), Arc::new(StaticToken::none()))
}
