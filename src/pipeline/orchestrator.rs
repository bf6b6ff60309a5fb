use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::{FailureRecord, PipelineError, RunStats, TaskError, TaskOutcome};
use crate::config::Config;
use crate::discovery::DiscoveredFile;
use crate::extract::{ExtractionError, TextExtractor, truncate_chars};
use crate::generation::{CompletionBackend, CompletionRequest, PromptError, PromptTemplate};
use crate::task::TaskKind;
use crate::ui::{Progress, Style};
use crate::writer::OutputWriter;

/// First failure of a run with `continue_on_error` disabled.
struct Abort {
    relative: PathBuf,
    task: TaskKind,
    reason: String,
}

/// Drives every discovered file through extraction, generation and writing.
///
/// Files are processed sequentially. Templates are compiled once, only for
/// the tasks the configured mode requests.
pub struct Pipeline<'a> {
    config: &'a Config,
    backend: &'a dyn CompletionBackend,
    extractor: TextExtractor,
    writer: OutputWriter,
    templates: Vec<PromptTemplate>,
}

impl<'a> Pipeline<'a> {
    /// Builds a pipeline, validating the prompt templates of the active tasks.
    pub fn new(
        config: &'a Config,
        backend: &'a dyn CompletionBackend,
    ) -> Result<Self, PromptError> {
        let templates = config
            .processing
            .mode
            .tasks()
            .iter()
            .map(|&task| PromptTemplate::parse(task, config.prompts.template(task)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            backend,
            extractor: TextExtractor::new(config.processing.pdf_method),
            writer: OutputWriter::new(config.processing.output_format, config.document_style()),
            templates,
        })
    }

    /// Processes `files` in order and returns the run statistics.
    ///
    /// With `continue_on_error` disabled the first failed task stops the run;
    /// the returned error carries the statistics gathered so far, with
    /// `discovered` still counting every file passed in.
    pub async fn run(
        &self,
        files: Vec<DiscoveredFile>,
        progress: &Progress,
    ) -> Result<RunStats, PipelineError> {
        let mut stats = RunStats {
            discovered: files.len(),
            ..RunStats::default()
        };

        for file in files {
            progress.set_file(&file.relative);

            let result = self.process_file(&file, &mut stats, progress).await;
            progress.inc();

            match result {
                Ok(outcomes) => tally(&mut stats, &outcomes),
                Err(abort) => {
                    stats.failed += 1;
                    tracing::info!(
                        file = %abort.relative.display(),
                        task = %abort.task,
                        "aborting run, continue_on_error is disabled"
                    );
                    return Err(PipelineError::Aborted {
                        relative: abort.relative,
                        task: abort.task,
                        reason: abort.reason,
                        stats: Box::new(stats),
                    });
                }
            }
        }

        Ok(stats)
    }

    async fn process_file(
        &self,
        file: &DiscoveredFile,
        stats: &mut RunStats,
        progress: &Progress,
    ) -> Result<Vec<TaskOutcome>, Abort> {
        let mut outcomes = Vec::with_capacity(self.templates.len());
        let mut pending = Vec::with_capacity(self.templates.len());

        for template in &self.templates {
            let task = template.task();
            let destination = self
                .writer
                .destination(self.config.output_dir(task), &file.relative);

            if self.config.advanced.skip_existing && destination.exists() {
                tracing::info!(
                    file = %file.relative.display(),
                    %task,
                    output = %destination.display(),
                    "output exists, skipping"
                );
                progress.println(Style::warning(format!(
                    "⊘ Skipped {} {task}: {} exists",
                    file.relative.display(),
                    destination.display()
                )));
                outcomes.push(TaskOutcome::Skipped(destination));
            } else {
                pending.push((template, destination));
            }
        }

        if pending.is_empty() {
            return Ok(outcomes);
        }

        let content = match self.extract(file, progress).await {
            Ok(content) => content,
            Err(err) => {
                for (template, _) in &pending {
                    let err = TaskError::Extraction(err.clone());
                    self.fail(file, template.task(), &err, stats, progress)?;
                    outcomes.push(TaskOutcome::Failed(err));
                }
                return Ok(outcomes);
            }
        };

        for (template, destination) in pending {
            let task = template.task();
            match self
                .run_task(template, &content, &destination, file, progress)
                .await
            {
                Ok(()) => {
                    stats.record_written(task);
                    progress.println(Style::success(format!(
                        "✓ {} {} → {}",
                        task.done_label(),
                        file.relative.display(),
                        destination.display()
                    )));
                    outcomes.push(TaskOutcome::Written(destination));
                }
                Err(err) => {
                    self.fail(file, task, &err, stats, progress)?;
                    outcomes.push(TaskOutcome::Failed(err));
                }
            }
        }

        Ok(outcomes)
    }

    async fn extract(
        &self,
        file: &DiscoveredFile,
        progress: &Progress,
    ) -> Result<String, ExtractionError> {
        let extractor = self.extractor;
        let path = file.path.clone();
        let started = Instant::now();

        let mut content = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| ExtractionError::Corrupt(format!("extraction task failed: {e}")))??;

        let elapsed = started.elapsed();
        tracing::info!(
            file = %file.relative.display(),
            chars = content.chars().count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "extracted text"
        );
        self.report_timing(progress, file, "extraction", elapsed);

        let max_chars = self.config.advanced.max_content_chars;
        if truncate_chars(&mut content, max_chars) {
            tracing::info!(
                file = %file.relative.display(),
                max_chars,
                "truncated extracted text"
            );
        }

        Ok(content)
    }

    async fn run_task(
        &self,
        template: &PromptTemplate,
        content: &str,
        destination: &Path,
        file: &DiscoveredFile,
        progress: &Progress,
    ) -> Result<(), TaskError> {
        let task = template.task();
        let request = CompletionRequest {
            model: self.config.api.model.clone(),
            prompt: template.render(content, &self.config.processing.output_language),
            max_tokens: self.config.advanced.max_tokens,
            temperature: self.config.advanced.temperature,
        };

        let started = Instant::now();
        let text = self.backend.complete(&request).await?;
        let elapsed = started.elapsed();
        tracing::info!(
            file = %file.relative.display(),
            %task,
            chars = text.chars().count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "generated text"
        );
        self.report_timing(progress, file, &format!("{task} generation"), elapsed);

        let started = Instant::now();
        self.writer.write(&text, destination, &file.stem())?;
        let elapsed = started.elapsed();
        tracing::info!(
            file = %file.relative.display(),
            %task,
            output = %destination.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "wrote output"
        );
        self.report_timing(progress, file, &format!("{task} write"), elapsed);

        Ok(())
    }

    /// Records a failed task; returns `Err` when the run must stop.
    fn fail(
        &self,
        file: &DiscoveredFile,
        task: TaskKind,
        err: &TaskError,
        stats: &mut RunStats,
        progress: &Progress,
    ) -> Result<(), Abort> {
        let reason = err.to_string();
        // The ✗ line below is the user-facing report
        tracing::info!(
            file = %file.relative.display(),
            %task,
            stage = err.stage(),
            error = %reason,
            "task failed"
        );
        progress.println(Style::error(format!(
            "✗ Failed {} {task}: {reason}",
            file.relative.display()
        )));

        stats.record_failure(FailureRecord {
            relative: file.relative.clone(),
            task,
            reason: reason.clone(),
        });

        if self.config.advanced.continue_on_error {
            Ok(())
        } else {
            Err(Abort {
                relative: file.relative.clone(),
                task,
                reason,
            })
        }
    }

    fn report_timing(
        &self,
        progress: &Progress,
        file: &DiscoveredFile,
        stage: &str,
        elapsed: Duration,
    ) {
        if self.config.advanced.show_timing {
            progress.println(Style::secondary(format!(
                "  {} {stage}: {:.2}s",
                file.relative.display(),
                elapsed.as_secs_f64()
            )));
        }
    }
}

fn tally(stats: &mut RunStats, outcomes: &[TaskOutcome]) {
    if outcomes
        .iter()
        .any(|outcome| matches!(outcome, TaskOutcome::Failed(_)))
    {
        stats.failed += 1;
    } else if outcomes
        .iter()
        .all(|outcome| matches!(outcome, TaskOutcome::Skipped(_)))
    {
        stats.skipped += 1;
    } else {
        stats.succeeded += 1;
    }
}
