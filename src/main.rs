use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use sm_highlight::cli::{CliArgs, OutputMode, RunMode};
use sm_highlight::config::HighlightConfig;
use sm_highlight::markdown::PageStyle;
use sm_highlight::site::{self, SourceKind};
use sm_highlight::theme::{self, ThemeSource};
use sm_highlight::{loader, RenderedPage};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    sm_highlight::tracing::init(args.verbose);

    let config = match args.into_config(HighlightConfig::load()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    // The one place load-chain failures end up: logged, pages left untouched
    match run(config.mode, &config.highlight).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(mode: RunMode, config: &HighlightConfig) -> Result<()> {
    let (inputs, output) = match mode {
        RunMode::ListThemes => {
            for info in theme::list_available_themes() {
                let source = match info.source {
                    ThemeSource::User => "user",
                    ThemeSource::Builtin => "builtin",
                };
                println!("{:<24} {:<24} {}", info.id, info.name, source);
            }
            return Ok(());
        }
        RunMode::Highlight { inputs, output } => (inputs, output),
    };

    let inputs = site::collect_inputs(&inputs).context("Failed to collect input files")?;
    if inputs.is_empty() {
        tracing::warn!("No HTML or Markdown files found");
    }

    let style = match theme::load_theme(&config.theme) {
        Ok(theme) => PageStyle::from_theme(&theme),
        Err(e) => {
            tracing::debug!("Using default page style: {}", e);
            PageStyle::default()
        }
    };

    let pages = inputs
        .iter()
        .map(|input| site::load_page(input, config, &style))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load pages")?;

    let rendered = loader::run(config, &pages)
        .await
        .with_context(|| format!("Highlighting with grammar {} failed", config.grammar))?;

    for (input, page) in inputs.iter().zip(&rendered) {
        report(page);

        let target = match &output {
            OutputMode::DryRun => continue,
            OutputMode::Directory(dir) => site::output_path(input, Some(dir)),
            OutputMode::InPlace => {
                // An unmodified HTML page is left alone; Markdown always needs its .html
                if input.kind == SourceKind::Html && page.mutated == 0 {
                    continue;
                }
                site::output_path(input, None)
            }
        };
        site::write_page(&target, &page.html)
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }

    Ok(())
}

fn report(page: &RenderedPage) {
    if page.failed > 0 {
        println!(
            "{}: {} highlighted, {} failed",
            page.path.display(),
            page.mutated,
            page.failed
        );
    } else {
        println!("{}: {} highlighted", page.path.display(), page.mutated);
    }
}
