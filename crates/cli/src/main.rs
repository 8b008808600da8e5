use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use editor::{Editor, EditorCommand, EditorConfig};
use timeline::{find_violations, Frame, Overlay, OverlayId, Placement, Row};

#[derive(Parser, Debug)]
#[command(name = "overlay-cli", about = "Inspect and edit timeline overlay compositions", version)]
struct Cli {
    /// Composition file: { "config": {...}, "overlays": [...] }
    #[arg(short, long)]
    composition: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report broken lane, span, row and id invariants.
    Check,
    /// Resolve pushes for a candidate placement without applying them.
    Push {
        #[arg(long)]
        id: OverlayId,
        #[arg(long, allow_negative_numbers = true)]
        from: Frame,
        #[arg(long)]
        duration: Frame,
        #[arg(long)]
        row: Row,
    },
    /// Split an overlay and print the resulting composition.
    Split {
        #[arg(long)]
        id: OverlayId,
        #[arg(long)]
        at: Frame,
    },
    /// Duplicate an overlay and print the resulting composition.
    Duplicate {
        #[arg(long)]
        id: OverlayId,
    },
    /// Apply a JSON list of editor commands in order.
    Replay { script: PathBuf },
}

#[derive(Debug, Serialize, Deserialize)]
struct Composition {
    #[serde(default)]
    config: EditorConfig,
    #[serde(default)]
    overlays: Vec<Overlay>,
}

impl Composition {
    fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let composition: Composition =
            serde_json::from_str(&raw).with_context(|| format!("parsing composition {}", path.display()))?;
        composition.config.validate().context("invalid editor config")?;
        Ok(composition)
    }

    fn into_editor(self) -> Result<Editor> {
        let violations = find_violations(&self.overlays, self.config.max_rows);
        if !violations.is_empty() {
            bail!("composition is inconsistent ({} problems); run `check` for details", violations.len());
        }
        Ok(Editor::with_overlays(self.config, self.overlays)?)
    }

    fn from_editor(editor: &Editor) -> Self {
        Self { config: editor.config().clone(), overlays: editor.overlays().to_vec() }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let composition = Composition::load(&cli.composition)?;
    info!(overlays = composition.overlays.len(), path = %cli.composition.display(), "composition loaded");

    match cli.command {
        Commands::Check => {
            let violations = find_violations(&composition.overlays, composition.config.max_rows);
            print_json(&json!({ "ok": violations.is_empty(), "violations": violations }))?;
            if !violations.is_empty() {
                bail!("{} invariant violations", violations.len());
            }
        }
        Commands::Push { id, from, duration, row } => {
            let editor = composition.into_editor()?;
            let candidate = Placement::new(id, from, duration, row);
            print_json(&editor.check_and_resolve_push(&candidate))?;
        }
        Commands::Split { id, at } => {
            let mut editor = composition.into_editor()?;
            let new_id = editor.split(id, at)?;
            info!(id, new_id, at, "split");
            print_json(&Composition::from_editor(&editor))?;
        }
        Commands::Duplicate { id } => {
            let mut editor = composition.into_editor()?;
            let new_id = editor.duplicate(id)?;
            info!(id, new_id, "duplicated");
            print_json(&Composition::from_editor(&editor))?;
        }
        Commands::Replay { script } => {
            let raw = fs::read_to_string(&script).with_context(|| format!("reading {}", script.display()))?;
            let commands: Vec<EditorCommand> =
                serde_json::from_str(&raw).with_context(|| format!("parsing command script {}", script.display()))?;
            let mut editor = composition.into_editor()?;
            let outcomes = replay(&mut editor, commands);
            print_json(&json!({ "outcomes": outcomes, "composition": Composition::from_editor(&editor) }))?;
        }
    }
    Ok(())
}

/// Apply every command, recording either its outcome or its error. A failed
/// command leaves the editor untouched, so the rest of the script still runs.
fn replay(editor: &mut Editor, commands: Vec<EditorCommand>) -> Vec<Value> {
    commands
        .into_iter()
        .enumerate()
        .map(|(step, command)| match editor.apply(command) {
            Ok(outcome) => json!({ "step": step, "result": outcome }),
            Err(err) => {
                warn!(step, %err, "command rejected");
                json!({ "step": step, "error": err.to_string() })
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
    run(Cli::parse())
}
