//! In-memory notebook, render loop and command registry.
//!
//! Useful for development and tests. Editors are only attached to cells
//! during a render pass, like a real UI framework that builds them on a
//! later frame than the structural insert.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak,
    atomic::{AtomicBool, Ordering},
};

use cellfix_core::{
    Activation, Cell, CellId, CellMetadata, CommandRegistry, ComputeSession, ContentKind,
    ControlSpec, FrameCallback, FrameScheduler, HostError, Notebook, RenderedOutput, TextEditor,
};
use futures::future::BoxFuture;
use serde_json::Value;
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Plain-text editor.
#[derive(Debug, Default)]
pub struct MemoryEditor {
    text: Mutex<String>,
    focused: AtomicBool,
}

impl MemoryEditor {
    /// Whether `focus` has been called.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

impl TextEditor for MemoryEditor {
    fn set_text(&self, text: &str) {
        *lock(&self.text) = text.to_string();
    }

    fn text(&self) -> String {
        lock(&self.text).clone()
    }

    fn focus(&self) {
        self.focused.store(true, Ordering::SeqCst);
    }
}

/// Notebook cell.
pub struct MemoryCell {
    id: CellId,
    kind: ContentKind,
    metadata: CellMetadata,
    editor: RwLock<Option<Arc<MemoryEditor>>>,
}

impl MemoryCell {
    fn new(kind: ContentKind, metadata: CellMetadata) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            kind,
            metadata,
            editor: RwLock::new(None),
        })
    }

    /// The editor, if rendered.
    #[must_use]
    pub fn memory_editor(&self) -> Option<Arc<MemoryEditor>> {
        self.editor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cell text, empty until an editor is rendered.
    #[must_use]
    pub fn text(&self) -> String {
        self.memory_editor().map(|e| e.text()).unwrap_or_default()
    }

    fn render(&self) {
        let mut editor = self.editor.write().unwrap_or_else(PoisonError::into_inner);
        if editor.is_none() {
            *editor = Some(Arc::new(MemoryEditor::default()));
        }
    }
}

impl Cell for MemoryCell {
    fn id(&self) -> CellId {
        self.id
    }

    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn metadata(&self) -> CellMetadata {
        self.metadata.clone()
    }

    fn editor(&self) -> Option<Arc<dyn TextEditor>> {
        self.memory_editor().map(|e| e as Arc<dyn TextEditor>)
    }
}

/// Notebook document.
pub struct MemoryNotebook {
    cells: RwLock<Vec<Arc<MemoryCell>>>,
    session: RwLock<Option<Arc<dyn ComputeSession>>>,
    renders_editors: AtomicBool,
}

impl MemoryNotebook {
    /// Create a notebook whose cells are already rendered.
    #[must_use]
    pub fn with_cells(kinds: &[ContentKind]) -> Arc<Self> {
        let notebook = Arc::new(Self {
            cells: RwLock::new(
                kinds
                    .iter()
                    .map(|kind| MemoryCell::new(*kind, CellMetadata::default()))
                    .collect(),
            ),
            session: RwLock::new(None),
            renders_editors: AtomicBool::new(true),
        });
        notebook.render();
        notebook
    }

    /// Bind a session to the notebook's editing context.
    pub fn attach_session(&self, session: Arc<dyn ComputeSession>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Stop (or resume) attaching editors during render passes.
    pub fn set_renders_editors(&self, enabled: bool) {
        self.renders_editors.store(enabled, Ordering::SeqCst);
    }

    /// Render pass: attach editors to cells that lack one.
    pub fn render(&self) {
        if !self.renders_editors.load(Ordering::SeqCst) {
            return;
        }
        for cell in self.memory_cells() {
            cell.render();
        }
    }

    /// Cells in document order.
    #[must_use]
    pub fn memory_cells(&self) -> Vec<Arc<MemoryCell>> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An output rendered inside the cell at `index`, attached to this notebook.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn output_in(self: &Arc<Self>, index: usize) -> Arc<MemoryOutput> {
        let cell = self.memory_cells()[index].id;
        let output = MemoryOutput::detached(cell);
        output.attach(Arc::clone(self));
        output
    }
}

impl Notebook for MemoryNotebook {
    fn cells(&self) -> Vec<Arc<dyn Cell>> {
        self.memory_cells()
            .into_iter()
            .map(|c| c as Arc<dyn Cell>)
            .collect()
    }

    fn cell_at(&self, index: usize) -> Option<Arc<dyn Cell>> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .map(|c| Arc::clone(c) as Arc<dyn Cell>)
    }

    fn insert_cell(
        &self,
        index: usize,
        kind: ContentKind,
        metadata: CellMetadata,
    ) -> Result<(), HostError> {
        let mut cells = self
            .cells
            .write()
            .map_err(|e| HostError::Internal(e.to_string()))?;
        if index > cells.len() {
            return Err(HostError::IndexOutOfRange {
                index,
                len: cells.len(),
            });
        }
        cells.insert(index, MemoryCell::new(kind, metadata));
        Ok(())
    }

    fn session(&self) -> Option<Arc<dyn ComputeSession>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Output area rendered inside a cell.
pub struct MemoryOutput {
    cell: CellId,
    notebook: RwLock<Option<Arc<MemoryNotebook>>>,
    controls: Mutex<Vec<(ControlSpec, Activation)>>,
}

impl MemoryOutput {
    /// An output not yet attached to any notebook.
    #[must_use]
    pub fn detached(cell: CellId) -> Arc<Self> {
        Arc::new(Self {
            cell,
            notebook: RwLock::new(None),
            controls: Mutex::new(Vec::new()),
        })
    }

    /// Attach the output to its notebook.
    pub fn attach(&self, notebook: Arc<MemoryNotebook>) {
        *self.notebook.write().unwrap_or_else(PoisonError::into_inner) = Some(notebook);
    }

    /// Controls rendered so far.
    #[must_use]
    pub fn controls(&self) -> Vec<ControlSpec> {
        lock(&self.controls)
            .iter()
            .map(|(spec, _)| spec.clone())
            .collect()
    }

    /// Activate the control labelled `label`, as a click would.
    #[must_use]
    pub fn click(&self, label: &str) -> Option<BoxFuture<'static, ()>> {
        lock(&self.controls)
            .iter()
            .find(|(spec, _)| spec.label == label)
            .map(|(_, on_activate)| on_activate())
    }
}

impl RenderedOutput for MemoryOutput {
    fn containing_cell(&self) -> Option<CellId> {
        Some(self.cell)
    }

    fn notebook(&self) -> Option<Arc<dyn Notebook>> {
        self.notebook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .map(|n| n as Arc<dyn Notebook>)
    }

    fn append_control(&self, spec: ControlSpec, on_activate: Activation) {
        lock(&self.controls).push((spec, on_activate));
    }
}

/// Render loop that runs a render pass over its notebooks before each frame callback.
pub struct MemoryRenderLoop {
    frames: Arc<dyn FrameScheduler>,
    notebooks: Arc<Mutex<Vec<Weak<MemoryNotebook>>>>,
}

impl MemoryRenderLoop {
    /// Drive render passes from `frames`.
    #[must_use]
    pub fn new(frames: Arc<dyn FrameScheduler>) -> Self {
        Self {
            frames,
            notebooks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Include `notebook` in render passes.
    pub fn watch(&self, notebook: &Arc<MemoryNotebook>) {
        lock(&self.notebooks).push(Arc::downgrade(notebook));
    }
}

impl FrameScheduler for MemoryRenderLoop {
    fn request_frame(&self, callback: FrameCallback) {
        let notebooks = Arc::clone(&self.notebooks);
        self.frames.request_frame(Box::new(move || {
            let live: Vec<_> = lock(&notebooks).iter().filter_map(Weak::upgrade).collect();
            for notebook in live {
                notebook.render();
            }
            callback();
        }));
    }
}

/// Command registry that records every execution.
#[derive(Default)]
pub struct MemoryCommands {
    executed: Mutex<Vec<(String, Value)>>,
}

impl MemoryCommands {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands executed so far, with their arguments.
    #[must_use]
    pub fn executed(&self) -> Vec<(String, Value)> {
        lock(&self.executed).clone()
    }
}

impl CommandRegistry for MemoryCommands {
    fn execute(&self, command: &str, args: &Value) -> Result<(), HostError> {
        lock(&self.executed).push((command.to_string(), args.clone()));
        Ok(())
    }
}
