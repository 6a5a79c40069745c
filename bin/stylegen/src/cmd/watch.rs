//! Watch command - recompile stylesheets on change

use std::{path::Path, time::Duration};

use color_eyre::eyre::{Result, WrapErr};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use stylegen_core::SiteContext;
use stylegen_generator::CompileStep;
use tokio::sync::mpsc;

use super::load_site;

/// File extensions whose changes trigger a recompile. Compiled `.css`
/// output is excluded so writing it does not retrigger the watcher.
const WATCHED_EXTENSIONS: &[&str] = &["scss", "sass", "rb", "config"];

/// Run the watch command.
///
/// Compiles once, then recompiles unconditionally after every change under
/// the source root until interrupted.
pub async fn run(config_path: &Path, debounce_ms: u64) -> Result<()> {
    tracing::info!(?config_path, debounce_ms, "Starting watch mode");

    let site = load_site(config_path)?;
    let step = CompileStep::from_config(&site.config.stylesheets);
    let source_root = step
        .source_root(&site)
        .wrap_err("Failed to resolve source root")?;

    // Initial compile
    compile_once(&step, &site);

    let (tx, mut rx) = mpsc::channel::<()>(16);
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res
                && is_relevant(&event)
            {
                let _ = tx.blocking_send(());
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    watcher
        .watch(&source_root, RecursiveMode::Recursive)
        .wrap_err_with(|| format!("Failed to watch {}", source_root.display()))?;

    println!();
    println!("  Watching {}", source_root.display());
    println!("  Press Ctrl+C to stop");
    println!();

    let debounce = Duration::from_millis(debounce_ms);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("  Stopping");
                break;
            }
            msg = rx.recv() => {
                if msg.is_none() {
                    break;
                }
                // Debounce, then drain any queued events
                tokio::time::sleep(debounce).await;
                while rx.try_recv().is_ok() {}

                println!("  Change detected, recompiling...");
                compile_once(&step, &site);
            }
        }
    }

    Ok(())
}

/// Compile once, reporting failures without stopping the watcher.
fn compile_once(step: &CompileStep, site: &SiteContext) {
    match step.run(site) {
        Ok(report) => {
            println!(
                "  ✓ Compiled {} file(s) in {}ms",
                report.manifest.len(),
                report.duration_ms
            );
        }
        Err(e) => {
            tracing::error!("Compile failed: {e}");
            eprintln!("  ✗ Compile failed: {e}");
        }
    }
}

/// Whether a filesystem event should trigger a recompile.
fn is_relevant(event: &Event) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
            | EventKind::Create(_)
            | EventKind::Remove(_)
    );

    kind_matches
        && event.paths.iter().any(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| WATCHED_EXTENSIONS.contains(&ext))
        })
}
