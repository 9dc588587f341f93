//! Scripted notebook demo.
//!
//! Run with: cargo run -p scripted-notebook [-- path/to/config.json]
//!
//! Renders an error output in a three-cell notebook, attaches the remediation
//! controls and activates each of them against a scripted kernel.

use std::sync::Arc;

use anyhow::Context;
use cellfix_core::{Cell, ContentKind, IntervalFrames, RemediationConfig, TextEditor};
use cellfix_notebook::memory::{MemoryCommands, MemoryNotebook, MemoryRenderLoop};
use cellfix_session::directory::{KernelScript, MemoryDirectory, MemoryKernel};
use cellfix_surface::Remediator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RemediationConfig::from_path(&path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => RemediationConfig::default(),
    };
    let labels: Vec<String> = config.options.iter().map(|o| o.label.clone()).collect();

    let directory = Arc::new(MemoryDirectory::new());
    let kernel = MemoryKernel::new("python3", KernelScript::Value("'hello world'".into()));
    directory.add(kernel.clone());

    let render_loop = Arc::new(MemoryRenderLoop::new(Arc::new(IntervalFrames::default())));
    let commands = Arc::new(MemoryCommands::new());
    let remediator = Remediator::new(config, directory, render_loop.clone(), commands.clone());

    let notebook = MemoryNotebook::with_cells(&[ContentKind::Code; 3]);
    render_loop.watch(&notebook);
    notebook.attach_session(kernel);
    let output = notebook.output_in(1);

    let attached = remediator
        .attach_controls(output.clone(), "application/vnd.jupyter.stderr")
        .await;
    tracing::info!(attached, "Rendered controls");

    for label in &labels {
        let Some(activation) = output.click(label) else {
            continue;
        };
        tokio::spawn(activation)
            .await
            .context("Activation task panicked")?;
    }

    for (index, cell) in notebook.memory_cells().iter().enumerate() {
        let text = cell.editor().map(|e| e.text()).unwrap_or_default();
        tracing::info!(
            index,
            kind = cell.kind().cell_type(),
            trusted = cell.metadata().is_trusted(),
            text = %text,
            "Cell"
        );
    }
    tracing::info!(commands = commands.executed().len(), "Follow-on commands issued");

    Ok(())
}
