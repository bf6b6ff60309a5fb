use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, ConfigError, ConfigManager, ResolveOptions};
use crate::discovery::{DiscoveryError, FileDiscoverer};
use crate::generation::{LlmClient, PromptError};
use crate::pipeline::{Pipeline, RunStats};
use crate::task::{ProcessingMode, TaskKind};
use crate::ui::{Progress, Style};

pub struct ProcessOptions {
    pub config: Option<PathBuf>,
    pub mode: Option<ProcessingMode>,
    pub model: Option<String>,
    pub to: Option<String>,
    pub quiet: bool,
}

/// Loads the configuration, processes every discovered file and prints the summary.
///
/// The summary is printed for aborted runs too, before the error is returned.
pub async fn run_process(options: ProcessOptions) -> Result<RunStats> {
    let manager = ConfigManager::new(options.config);
    tracing::debug!(path = %manager.config_path().display(), "loading configuration");

    let resolve = ResolveOptions {
        mode: options.mode,
        model: options.model,
        to: options.to,
    };
    let config = manager.load_resolved(&resolve).map_err(with_hint)?;

    let discoverer = FileDiscoverer::new(
        &config.paths.input_dir,
        &config.processing.file_types,
    )?;

    let client = LlmClient::new(
        &config.api.base_url,
        config.api.api_key.clone(),
        Duration::from_secs(config.advanced.timeout),
        config.advanced.retry_policy(),
    )?;
    let pipeline = Pipeline::new(&config, &client)?;

    let files: Vec<_> = discoverer.iter().collect();
    let total = files.len();
    tracing::info!(
        root = %discoverer.root().display(),
        files = total,
        url = client.url(),
        "starting run"
    );

    if !options.quiet {
        print_banner(&config, total);
    }

    let progress = Progress::new(total as u64, config.advanced.show_progress, options.quiet);
    let result = pipeline.run(files, &progress).await;
    progress.finish();

    match result {
        Ok(stats) => {
            print_summary(&config, &stats);
            Ok(stats)
        }
        Err(err) => {
            print_summary(&config, err.stats());
            Err(err.into())
        }
    }
}

/// Maps an error from [`run_process`] to a process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<PromptError>().is_some()
    {
        exitcode::CONFIG
    } else if err.downcast_ref::<DiscoveryError>().is_some() {
        exitcode::NOINPUT
    } else {
        // Aborted runs and client construction failures
        exitcode::SOFTWARE
    }
}

fn with_hint(err: ConfigError) -> anyhow::Error {
    let hint = match &err {
        ConfigError::NotFound(_) => Some(
            "Create a config.yaml in the working directory or pass its path: papertrans <config>",
        ),
        ConfigError::MissingKey("api.model") => {
            Some("Set api.model in the config file or pass --model <name>")
        }
        ConfigError::MissingKey(_) => Some("Add the missing key to the config file"),
        _ => None,
    };

    let err = match hint {
        Some(hint) => anyhow::Error::from(err).context(hint),
        None => anyhow::Error::from(err),
    };
    err.context("Failed to load configuration")
}

fn print_banner(config: &Config, total: usize) {
    eprintln!(
        "{}",
        Style::secondary(format!(
            "papertrans v{} · model {} · mode {} · {} · {}",
            env!("CARGO_PKG_VERSION"),
            config.api.model,
            config.processing.mode,
            config.processing.output_language,
            config.processing.output_format,
        ))
    );
    eprintln!(
        "{}",
        Style::secondary(format!(
            "Found {total} file(s) in {}",
            config.paths.input_dir.display()
        ))
    );
}

fn print_summary(config: &Config, stats: &RunStats) {
    let tasks = config.processing.mode.tasks();
    let row = |label: &str, value: String| {
        println!("  {} {}", Style::label(format!("{label:<13}")), Style::value(value));
    };

    println!();
    println!("{}", Style::header("Summary"));
    row("Total files", stats.discovered.to_string());
    row("Successful", stats.succeeded.to_string());
    row("Skipped", stats.skipped.to_string());
    row("Failed", stats.failed.to_string());

    for &task in tasks {
        let (label, written) = match task {
            TaskKind::Translation => ("Translations", stats.translated),
            TaskKind::Summarization => ("Summaries", stats.summarized),
        };
        row(label, format!("{written} → {}", config.output_dir(task).display()));
    }

    if stats.has_failures() {
        println!();
        println!("{}", Style::header("Failures"));
        for failure in &stats.failures {
            println!(
                "  {} ({}): {}",
                failure.relative.display(),
                failure.task,
                failure.reason
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::LlmError;
    use crate::pipeline::PipelineError;
    use std::path::Path;

    #[test]
    fn test_exit_codes() {
        let config = anyhow::Error::from(ConfigError::MissingKey("api.model"));
        assert_eq!(exit_code_for(&config), exitcode::CONFIG);

        let hinted = with_hint(ConfigError::NotFound(PathBuf::from("config.yaml")));
        assert_eq!(exit_code_for(&hinted), exitcode::CONFIG);

        let prompt = anyhow::Error::from(PromptError::MissingContent {
            task: TaskKind::Translation,
        });
        assert_eq!(exit_code_for(&prompt), exitcode::CONFIG);

        let discovery = anyhow::Error::from(DiscoveryError::MissingRoot(
            Path::new("missing").to_path_buf(),
        ));
        assert_eq!(exit_code_for(&discovery), exitcode::NOINPUT);

        let aborted = anyhow::Error::from(PipelineError::Aborted {
            relative: PathBuf::from("b.pdf"),
            task: TaskKind::Translation,
            reason: "no extractable text".to_string(),
            stats: Box::default(),
        });
        assert_eq!(exit_code_for(&aborted), exitcode::SOFTWARE);

        let client = anyhow::Error::from(LlmError::Network("tls".to_string()));
        assert_eq!(exit_code_for(&client), exitcode::SOFTWARE);
    }

    #[test]
    fn test_hint_keeps_error_message() {
        let err = with_hint(ConfigError::MissingKey("api.model"));
        let message = format!("{err:#}");
        assert!(message.contains("--model"));
        assert!(message.contains("api.model"));
    }
}
