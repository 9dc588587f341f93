//! Cell insertion and content injection.
//!
//! The host builds a cell's editor on a render pass after the structural
//! insert, so population is a second phase that polls for the editor on the
//! render loop and gives up after a bounded number of frames.

use std::sync::Arc;

use cellfix_core::{
    Cell, CellMetadata, CommandRegistry, FollowOnCommand, FrameResolution, FrameResolver,
    FrameScheduler, Notebook, RemediationOption, RenderedOutput,
};
use serde::Serialize;

/// How population of an inserted cell ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationStatus {
    /// Content written, editor focused, follow-on command issued.
    Populated,
    /// The editor never appeared; the cell stays empty.
    EditorUnavailable,
}

/// A cell that has been inserted and is waiting to be populated.
pub struct Population {
    /// Index the cell was inserted at.
    pub index: usize,
    /// The inserted cell.
    pub cell: Arc<dyn Cell>,
    resolution: FrameResolution<()>,
}

impl Population {
    /// Wait for population to finish or give up.
    pub async fn finished(self) -> PopulationStatus {
        if self.resolution.await.is_some() {
            PopulationStatus::Populated
        } else {
            tracing::warn!(index = self.index, "Editor never attached, leaving cell empty");
            PopulationStatus::EditorUnavailable
        }
    }
}

/// Inserts remediation results as new cells.
#[derive(Clone)]
pub struct CellInjector {
    frames: FrameResolver,
    commands: Arc<dyn CommandRegistry>,
    follow_on: FollowOnCommand,
}

impl CellInjector {
    /// Create an injector that polls `scheduler` for up to `editor_frames` frames.
    #[must_use]
    pub fn new(
        scheduler: Arc<dyn FrameScheduler>,
        editor_frames: u32,
        commands: Arc<dyn CommandRegistry>,
        follow_on: FollowOnCommand,
    ) -> Self {
        Self {
            frames: FrameResolver::new(scheduler, editor_frames),
            commands,
            follow_on,
        }
    }

    /// Index of the cell containing `output`, by identity.
    #[must_use]
    pub fn locate(notebook: &dyn Notebook, output: &dyn RenderedOutput) -> Option<usize> {
        let target = output.containing_cell()?;
        notebook.cells().iter().position(|cell| cell.id() == target)
    }

    /// Insert a cell for `option` right after the cell containing `output`
    /// and start populating it with `value`.
    ///
    /// Returns `None` if nothing was inserted. The caller need not await the
    /// returned [`Population`].
    pub fn insert_and_populate(
        &self,
        notebook: &dyn Notebook,
        output: &dyn RenderedOutput,
        option: &RemediationOption,
        value: String,
    ) -> Option<Population> {
        let Some(position) = Self::locate(notebook, output) else {
            tracing::error!(label = %option.label, "Output is not inside any cell of its notebook");
            return None;
        };
        let index = position + 1;

        if let Err(e) =
            notebook.insert_cell(index, option.kind, CellMetadata::for_inserted(option.kind))
        {
            tracing::error!(index, "Failed to insert remediation cell: {e}");
            return None;
        }
        let Some(cell) = notebook.cell_at(index) else {
            tracing::error!(index, "Inserted cell is missing");
            return None;
        };
        tracing::info!(index, kind = option.kind.cell_type(), label = %option.label, "Inserted remediation cell");

        let target = Arc::clone(&cell);
        let commands = Arc::clone(&self.commands);
        let follow_on = self.follow_on.clone();
        let resolution = self.frames.resolve("cell editor", move || {
            let editor = target.editor()?;
            editor.set_text(&value);
            editor.focus();
            if let Err(e) = commands.execute(&follow_on.command, &follow_on.args) {
                tracing::warn!(command = %follow_on.command, "Follow-on command failed: {e}");
            }
            Some(())
        });

        Some(Population {
            index,
            cell,
            resolution,
        })
    }
}
