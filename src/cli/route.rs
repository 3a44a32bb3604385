//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_summary_json, format_summary_text, format_topics_json, format_topics_text,
    format_usage_json, format_usage_text,
};
use crate::config::{ConfigLoader, CorpusConfig, GenerationSettings, PromptSettings};
use crate::error::ApiError;
use crate::generation::{BatchExecutor, BatchPlan, BatchPlanner, RetryPolicy, RunSummary};
use crate::progress::{LogObserver, ProgressRuntime, TerminalObserver};
use crate::prompt::PromptCatalog;
use crate::provider::{GenerationClient, OpenAIResponsesClient, RequestBuilder};
use crate::sink::OutputSink;
use crate::usage::UsageReporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Command-line overrides for one `generate` invocation
#[derive(Debug, Clone, Default)]
pub struct GenerateOverrides {
    pub count: Option<usize>,
    pub batch_size: Option<usize>,
    pub output: Option<PathBuf>,
    pub no_cache: bool,
    pub concurrency: Option<usize>,
    pub no_usage: bool,
}

impl GenerateOverrides {
    pub fn apply(&self, settings: &GenerationSettings) -> GenerationSettings {
        let mut settings = settings.clone();
        if let Some(count) = self.count {
            settings.total_count = count;
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(ref output) = self.output {
            settings.output_file = output.clone();
        }
        if self.no_cache {
            settings.prompt_caching = false;
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if self.no_usage {
            settings.report_usage = false;
        }
        settings
    }
}

/// Runtime context for CLI execution: workspace root and effective configuration.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CorpusConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: CorpusConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a command and return its rendered output.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.route(command).await;
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn route(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Generate {
                count,
                batch_size,
                output,
                no_cache,
                concurrency,
                no_usage,
                format,
            } => {
                let overrides = GenerateOverrides {
                    count: *count,
                    batch_size: *batch_size,
                    output: output.clone(),
                    no_cache: *no_cache,
                    concurrency: *concurrency,
                    no_usage: *no_usage,
                };
                self.handle_generate(&overrides, format).await
            }
            Commands::Usage { format } => self.handle_usage(format).await,
            Commands::Topics { format } => self.handle_topics(format),
            Commands::Config => self.config.to_toml_string(),
        }
    }

    async fn handle_generate(
        &self,
        overrides: &GenerateOverrides,
        format: &str,
    ) -> Result<String, ApiError> {
        let generation = overrides.apply(&self.config.generation);
        self.effective_config(&generation).ensure_valid()?;

        // Credential first: a missing key must fail before the output is truncated.
        let client = OpenAIResponsesClient::from_settings(&self.config.provider)?;

        let mut runtime = ProgressRuntime::for_new_run().with_observer(Arc::new(LogObserver));
        if format != "json" {
            runtime = runtime.with_observer(Arc::new(TerminalObserver::new()));
        }
        let summary = self
            .generate_with_client(&client, &generation, Some(Arc::new(runtime)))
            .await?;

        let rendered = if format == "json" {
            format_summary_json(&summary)
        } else {
            format_summary_text(&summary)
        };
        match summary.output_error {
            Some(error) => Err(ApiError::OutputInterrupted {
                accepted: summary.accepted,
                requested: summary.requested,
                error,
                summary: rendered,
            }),
            None => Ok(rendered),
        }
    }

    /// Run the generation pipeline with `generation` settings against any client.
    pub async fn generate_with_client<C: GenerationClient + ?Sized>(
        &self,
        client: &C,
        generation: &GenerationSettings,
        progress: Option<Arc<ProgressRuntime>>,
    ) -> Result<RunSummary, ApiError> {
        let plan = BatchPlan::new(generation.total_count, generation.batch_size)?;
        let executor = self
            .build_executor(client.model_name(), generation)?
            .with_progress(progress.clone());
        let usage = generation
            .report_usage
            .then(|| UsageReporter::new(progress.clone()));
        let planner = BatchPlanner::new(executor)
            .with_concurrency(generation.concurrency)
            .with_preview_lines(generation.preview_lines)
            .with_usage_reporter(usage)
            .with_progress(progress);

        let mut sink = OutputSink::create(self.resolve_path(&generation.output_file))?;
        let (_, summary) = planner.run(client, &plan, &mut sink).await;
        Ok(summary)
    }

    async fn handle_usage(&self, format: &str) -> Result<String, ApiError> {
        self.config.ensure_valid()?;
        let client = OpenAIResponsesClient::from_settings(&self.config.provider)?;
        let progress =
            Arc::new(ProgressRuntime::for_new_run().with_observer(Arc::new(LogObserver)));
        let executor = self
            .build_executor(client.model_name(), &self.config.generation)?
            .with_progress(Some(progress.clone()));
        let usage = UsageReporter::new(Some(progress))
            .report(&executor, &client)
            .await;

        if format == "json" {
            Ok(format_usage_json(usage.as_ref()))
        } else {
            Ok(format_usage_text(usage.as_ref()))
        }
    }

    fn handle_topics(&self, format: &str) -> Result<String, ApiError> {
        let catalog = self.load_catalog()?;
        if format == "json" {
            Ok(format_topics_json(catalog.topics()))
        } else {
            Ok(format_topics_text(catalog.topics()))
        }
    }

    fn build_executor(
        &self,
        model: &str,
        generation: &GenerationSettings,
    ) -> Result<BatchExecutor, ApiError> {
        let catalog = Arc::new(self.load_catalog()?);
        let provider = &self.config.provider;
        let builder = RequestBuilder::new(model, catalog)
            .with_verbosity(provider.verbosity.clone())
            .with_reasoning_effort(provider.reasoning_effort.clone());
        Ok(BatchExecutor::new(
            builder,
            RetryPolicy::from_settings(provider, generation),
        ))
    }

    fn load_catalog(&self) -> Result<PromptCatalog, ApiError> {
        let settings = PromptSettings {
            topics_file: self
                .config
                .prompt
                .topics_file
                .as_deref()
                .map(|p| self.resolve_path(p)),
            template_file: self
                .config
                .prompt
                .template_file
                .as_deref()
                .map(|p| self.resolve_path(p)),
            topic_seed: self.config.prompt.topic_seed,
        };
        PromptCatalog::load(&settings)
    }

    fn effective_config(&self, generation: &GenerationSettings) -> CorpusConfig {
        CorpusConfig {
            generation: generation.clone(),
            ..self.config.clone()
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}
