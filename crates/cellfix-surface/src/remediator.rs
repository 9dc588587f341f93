//! Remediation controls and the activation pipeline.
//!
//! An eligible output gets one control per configured option. Activating a
//! control runs execute, insert and populate on the output's binding. Each
//! activation is independent: there is no debouncing, so two quick
//! activations both insert, each after its own snapshot of the position.

use std::sync::Arc;

use cellfix_core::{
    Activation, CommandRegistry, ComputeSession, ControlSpec, FrameScheduler, RemediationConfig,
    RemediationOption, RenderedOutput, Resolver, SessionDirectory,
};
use cellfix_kernel::Correlator;
use cellfix_notebook::CellInjector;
use cellfix_session::{Binding, SessionBinder};
use futures::FutureExt;

use crate::ActivationReport;

struct Inner {
    error_mime_type: String,
    options: Vec<RemediationOption>,
    control_classes: Vec<String>,
    binder: SessionBinder,
    correlator: Correlator,
    injector: CellInjector,
}

/// Offers remediation on error outputs.
#[derive(Clone)]
pub struct Remediator {
    inner: Arc<Inner>,
}

impl Remediator {
    /// Create a remediator from its config and the host collaborators.
    #[must_use]
    pub fn new(
        config: RemediationConfig,
        directory: Arc<dyn SessionDirectory>,
        frames: Arc<dyn FrameScheduler>,
        commands: Arc<dyn CommandRegistry>,
    ) -> Self {
        let RemediationConfig {
            error_mime_type,
            options,
            expression,
            session_poll,
            editor_frames,
            follow_on,
            control_classes,
        } = config;

        Self {
            inner: Arc::new(Inner {
                error_mime_type,
                options,
                control_classes,
                binder: SessionBinder::new(directory, Resolver::new(session_poll)),
                correlator: Correlator::new(expression),
                injector: CellInjector::new(frames, editor_frames, commands, follow_on),
            }),
        }
    }

    /// Whether outputs of `mime_type` are offered remediation.
    #[must_use]
    pub fn is_error_output(&self, mime_type: &str) -> bool {
        mime_type == self.inner.error_mime_type
    }

    /// Called by the host once per rendered output.
    ///
    /// Renders the configured controls if the output is an error stream and a
    /// session can be bound to it. Returns the number of controls rendered.
    pub async fn attach_controls(&self, output: Arc<dyn RenderedOutput>, mime_type: &str) -> usize {
        if !self.is_error_output(mime_type) {
            tracing::trace!(mime_type, "Not an error output");
            return 0;
        }
        let Some(binding) = self.inner.binder.bind(output.as_ref()).await else {
            return 0;
        };

        for option in &self.inner.options {
            let spec = ControlSpec {
                label: option.label.clone(),
                classes: self.inner.control_classes.clone(),
            };
            output.append_control(spec, self.activation(&binding, &output, option));
        }
        tracing::debug!(
            session = %binding.session.id(),
            controls = self.inner.options.len(),
            "Attached remediation controls"
        );
        self.inner.options.len()
    }

    fn activation(
        &self,
        binding: &Binding,
        output: &Arc<dyn RenderedOutput>,
        option: &RemediationOption,
    ) -> Activation {
        let this = self.clone();
        let (binding, output, option) = (binding.clone(), Arc::clone(output), option.clone());
        Arc::new(move || {
            let (this, binding, output, option) =
                (this.clone(), binding.clone(), Arc::clone(&output), option.clone());
            async move {
                this.run(&binding, output.as_ref(), &option).await;
            }
            .boxed()
        })
    }

    /// Run one activation: execute `option` on the bound session, insert the
    /// result after `output` and wait for the cell to be populated.
    ///
    /// Never fails; every problem is logged and reflected in the report.
    pub async fn run(
        &self,
        binding: &Binding,
        output: &dyn RenderedOutput,
        option: &RemediationOption,
    ) -> ActivationReport {
        let session = binding.session.id();
        let outcome = match self
            .inner
            .correlator
            .execute(binding.session.as_ref(), option)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(session = %session, label = %option.label, "Remediation abandoned: {e}");
                return ActivationReport::abandoned(session);
            }
        };

        let Some(population) = self.inner.injector.insert_and_populate(
            binding.notebook.as_ref(),
            output,
            option,
            outcome.value().to_string(),
        ) else {
            return ActivationReport {
                outcome: Some(outcome),
                ..ActivationReport::abandoned(session)
            };
        };

        let inserted_at = population.index;
        let status = population.finished().await;
        ActivationReport {
            session,
            outcome: Some(outcome),
            inserted_at: Some(inserted_at),
            population: Some(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use cellfix_core::{Cell, CellId, ContentKind, ExecuteReply, IntervalFrames, PollPolicy};
    use cellfix_kernel::ExecutionOutcome;
    use cellfix_notebook::{
        PopulationStatus,
        memory::{MemoryCommands, MemoryNotebook, MemoryOutput, MemoryRenderLoop},
    };
    use cellfix_session::directory::{KernelScript, MemoryDirectory, MemoryKernel};

    use super::*;

    const STDERR: &str = "application/vnd.jupyter.stderr";

    struct Host {
        directory: Arc<MemoryDirectory>,
        render_loop: Arc<MemoryRenderLoop>,
        commands: Arc<MemoryCommands>,
        remediator: Remediator,
    }

    fn host(options: Vec<RemediationOption>) -> Host {
        let directory = Arc::new(MemoryDirectory::new());
        let render_loop = Arc::new(MemoryRenderLoop::new(Arc::new(IntervalFrames::default())));
        let commands = Arc::new(MemoryCommands::new());
        let config = RemediationConfig {
            options,
            session_poll: PollPolicy::new(20, 50),
            ..RemediationConfig::default()
        };
        let remediator = Remediator::new(
            config,
            directory.clone(),
            render_loop.clone(),
            commands.clone(),
        );
        Host {
            directory,
            render_loop,
            commands,
            remediator,
        }
    }

    fn fix(code: &str) -> RemediationOption {
        RemediationOption::new(ContentKind::Code, code, "Fix Error")
    }

    fn notebook(host: &Host, cells: usize) -> Arc<MemoryNotebook> {
        let notebook = MemoryNotebook::with_cells(&vec![ContentKind::Code; cells]);
        host.render_loop.watch(&notebook);
        notebook
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_inserts_result_after_output() {
        let host = host(vec![fix("X")]);
        let kernel = MemoryKernel::new("python3", KernelScript::Value("42".into()));
        host.directory.add(kernel.clone());
        let notebook = notebook(&host, 3);
        notebook.attach_session(kernel.clone());
        let output = notebook.output_in(1);

        assert_eq!(host.remediator.attach_controls(output.clone(), STDERR).await, 1);
        output.click("Fix Error").unwrap().await;

        assert_eq!(notebook.len(), 4);
        let cell = &notebook.memory_cells()[2];
        assert_eq!(cell.kind(), ContentKind::Code);
        assert!(cell.metadata().is_trusted());
        assert_eq!(cell.text(), "42");
        assert_eq!(host.commands.executed().len(), 1);
        assert_eq!(kernel.requests()[0].code, "X");
        assert_eq!(kernel.requests()[0].user_expressions["output"], "result");
    }

    #[tokio::test(start_paused = true)]
    async fn test_controls_follow_config() {
        let host = host(RemediationConfig::default().options);
        host.directory
            .add(MemoryKernel::new("python3", KernelScript::Value("v".into())));
        let notebook = notebook(&host, 1);
        let output = notebook.output_in(0);

        assert_eq!(host.remediator.attach_controls(output.clone(), STDERR).await, 2);

        let controls = output.controls();
        assert_eq!(controls[0].label, "Fix Error");
        assert_eq!(controls[1].label, "Show Error Explanation");
        assert_eq!(controls[0].classes, vec!["jp-Button", "jp-mod-small"]);

        output.click("Show Error Explanation").unwrap().await;
        let cell = &notebook.memory_cells()[1];
        assert_eq!(cell.kind(), ContentKind::Narrative);
        assert!(!cell.metadata().is_trusted());
        assert_eq!(cell.text(), "v");
    }

    #[tokio::test(start_paused = true)]
    async fn test_eligibility_requires_session_and_error_mime() {
        for (running, mime) in [
            (false, STDERR),
            (false, "text/plain"),
            (true, "text/plain"),
            (true, "application/vnd.jupyter.stdout"),
            (true, STDERR),
        ] {
            let host = host(vec![fix("X")]);
            if running {
                host.directory
                    .add(MemoryKernel::new("python3", KernelScript::Value("42".into())));
            }
            let notebook = notebook(&host, 1);
            let output = notebook.output_in(0);

            let attached = host.remediator.attach_controls(output.clone(), mime).await;

            let eligible = running && mime == STDERR;
            assert_eq!(attached, usize::from(eligible), "running={running} mime={mime}");
            assert_eq!(output.controls().len(), attached);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_session_skips_all_resolution() {
        let host = host(vec![fix("X")]);
        let output = MemoryOutput::detached(CellId::new_v4());
        let started = tokio::time::Instant::now();

        assert_eq!(host.remediator.attach_controls(output.clone(), STDERR).await, 0);

        assert_eq!(started.elapsed(), std::time::Duration::ZERO);
        assert_eq!(host.directory.listing_count(), 1);
        assert_eq!(host.directory.connect_count(), 0);
        assert!(output.controls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_session_runs_remediation() {
        let host = host(vec![fix("X")]);
        let kernel = MemoryKernel::new("python3", KernelScript::Value("7".into()));
        host.directory.add(kernel.clone());
        let notebook = notebook(&host, 2);
        let output = notebook.output_in(0);

        assert_eq!(host.remediator.attach_controls(output.clone(), STDERR).await, 1);
        output.click("Fix Error").unwrap().await;

        assert_eq!(host.directory.connect_count(), 1);
        assert_eq!(kernel.requests().len(), 1);
        assert_eq!(notebook.memory_cells()[1].text(), "7");
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_error_still_inserts_empty_cell() {
        let host = host(vec![fix("1/0")]);
        let kernel = MemoryKernel::new(
            "python3",
            KernelScript::Reply(ExecuteReply::Error {
                ename: "ZeroDivisionError".into(),
                evalue: "division by zero".into(),
                traceback: vec!["A".into(), "B".into()],
            }),
        );
        host.directory.add(kernel.clone());
        let notebook = notebook(&host, 2);
        notebook.attach_session(kernel.clone());
        let output = notebook.output_in(0);
        let binding = bind(&host, &output).await;

        let report = host.remediator.run(&binding, output.as_ref(), &fix("1/0")).await;

        assert_eq!(
            report.outcome,
            Some(ExecutionOutcome::Error { traceback: "A\nB".into() })
        );
        assert_eq!(report.inserted_at, Some(1));
        assert_eq!(report.population, Some(PopulationStatus::Populated));
        assert_eq!(notebook.len(), 3);
        assert_eq!(notebook.memory_cells()[1].text(), "");
        assert_eq!(host.commands.executed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_reply_inserts_nothing() {
        let host = host(vec![fix("X")]);
        let kernel = MemoryKernel::new("python3", KernelScript::Hangup);
        host.directory.add(kernel.clone());
        let notebook = notebook(&host, 2);
        notebook.attach_session(kernel.clone());
        let output = notebook.output_in(0);
        let binding = bind(&host, &output).await;

        let report = host.remediator.run(&binding, output.as_ref(), &fix("X")).await;

        assert_eq!(report, ActivationReport::abandoned(kernel.id()));
        assert_eq!(notebook.len(), 2);
        assert!(host.commands.executed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_editor_timeout_leaves_empty_cell() {
        let host = host(vec![fix("X")]);
        let kernel = MemoryKernel::new("python3", KernelScript::Value("42".into()));
        host.directory.add(kernel.clone());
        let notebook = notebook(&host, 1);
        notebook.attach_session(kernel.clone());
        notebook.set_renders_editors(false);
        let output = notebook.output_in(0);
        let binding = bind(&host, &output).await;

        let report = host.remediator.run(&binding, output.as_ref(), &fix("X")).await;

        assert!(report.outcome.as_ref().is_some_and(ExecutionOutcome::is_success));
        assert_eq!(report.population, Some(PopulationStatus::EditorUnavailable));
        assert_eq!(notebook.len(), 2);
        assert!(host.commands.executed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_activation_is_not_debounced() {
        let host = host(vec![fix("X")]);
        let kernel = MemoryKernel::new("python3", KernelScript::Value("42".into()));
        host.directory.add(kernel.clone());
        let notebook = notebook(&host, 3);
        notebook.attach_session(kernel.clone());
        let output = notebook.output_in(1);
        host.remediator.attach_controls(output.clone(), STDERR).await;

        let first = tokio::spawn(output.click("Fix Error").unwrap());
        let second = tokio::spawn(output.click("Fix Error").unwrap());
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(kernel.requests().len(), 2);
        assert_eq!(notebook.len(), 5);
        let inserted: Vec<_> = notebook.memory_cells()[2..4].iter().map(|c| c.text()).collect();
        assert_eq!(inserted, vec!["42", "42"]);
        assert_eq!(host.commands.executed().len(), 2);
    }

    async fn bind(host: &Host, output: &Arc<MemoryOutput>) -> Binding {
        host.remediator
            .inner
            .binder
            .bind(output.as_ref())
            .await
            .unwrap()
    }

    #[test]
    fn test_is_error_output() {
        let host = host(vec![fix("X")]);
        assert!(host.remediator.is_error_output(STDERR));
        assert!(!host.remediator.is_error_output("application/vnd.jupyter.stdout"));
    }
}
