//! Integration tests for configuration loading and CLI routing

use corpusgen::cli::{Cli, Commands, RunContext};
use corpusgen::config::{ConfigLoader, CorpusConfig};
use corpusgen::error::ApiError;
use clap::Parser;
use std::fs;
use tempfile::TempDir;

use crate::integration::with_isolated_home;

const RUN_CONFIG: &str = r#"
[provider]
model = "gpt-5-mini"
api_key_env = "CORPUSGEN_IT_UNSET_KEY"
request_timeout_secs = 30

[generation]
total_count = 40
batch_size = 8
output_file = "corpus/out.txt"
prompt_caching = false

[prompt]
topic_seed = 2
"#;

fn run(context: &RunContext, command: &Commands) -> Result<String, ApiError> {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(context.execute(command))
}

#[test]
fn test_workspace_config_reaches_run_context() {
    let temp = TempDir::new().unwrap();
    with_isolated_home(&temp, || {
        let workspace = temp.path().join("ws");
        fs::create_dir_all(workspace.join("config")).unwrap();
        fs::write(workspace.join("config").join("config.toml"), RUN_CONFIG).unwrap();

        let context = RunContext::new(workspace.clone(), None).unwrap();
        let config = context.config();
        assert_eq!(config.provider.model, "gpt-5-mini");
        assert_eq!(config.provider.request_timeout_secs, 30);
        assert_eq!(config.generation.total_count, 40);
        assert_eq!(config.generation.batch_size, 8);
        assert!(!config.generation.prompt_caching);
        assert_eq!(config.prompt.topic_seed, 2);
        assert!(config.validate().is_ok());
    });
}

#[test]
fn test_config_command_renders_loadable_toml() {
    let temp = TempDir::new().unwrap();
    with_isolated_home(&temp, || {
        let config_file = temp.path().join("run.toml");
        fs::write(&config_file, RUN_CONFIG).unwrap();
        let context = RunContext::new(temp.path().to_path_buf(), Some(config_file)).unwrap();

        let rendered = run(&context, &Commands::Config).unwrap();
        let reparsed: CorpusConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.generation, context.config().generation);
        assert_eq!(reparsed.provider, context.config().provider);
    });
}

#[test]
fn test_missing_credential_fails_before_touching_output() {
    let temp = TempDir::new().unwrap();
    with_isolated_home(&temp, || {
        std::env::remove_var("CORPUSGEN_IT_UNSET_KEY");
        let config_file = temp.path().join("run.toml");
        fs::write(&config_file, RUN_CONFIG).unwrap();
        let output = temp.path().join("corpus").join("out.txt");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, "previous run\n").unwrap();

        let context = RunContext::new(temp.path().to_path_buf(), Some(config_file)).unwrap();
        let cli = Cli::try_parse_from(["corpusgen", "generate", "--count", "5"]).unwrap();
        let result = run(&context, &cli.command);

        match result {
            Err(ApiError::MissingCredential(var)) => assert_eq!(var, "CORPUSGEN_IT_UNSET_KEY"),
            other => panic!("Expected missing credential, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous run\n");
    });
}

#[test]
fn test_topics_command_uses_topics_file() {
    let temp = TempDir::new().unwrap();
    with_isolated_home(&temp, || {
        fs::write(
            temp.path().join("topics.json"),
            r#"[{"topic": "Weather", "examples": ["It rained."]}, {"topic": "Markets"}]"#,
        )
        .unwrap();
        let config_file = temp.path().join("run.toml");
        fs::write(&config_file, "[prompt]\ntopics_file = \"topics.json\"\n").unwrap();

        let context = RunContext::new(temp.path().to_path_buf(), Some(config_file)).unwrap();
        let rendered = run(
            &context,
            &Commands::Topics {
                format: "json".to_string(),
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["topics"][0]["topic"], "Weather");
        assert_eq!(value["topics"][1]["examples"], serde_json::json!([]));
    });
}

#[test]
fn test_invalid_config_file_is_reported() {
    let temp = TempDir::new().unwrap();
    with_isolated_home(&temp, || {
        let config_file = temp.path().join("broken.toml");
        fs::write(&config_file, "[generation]\nbatch_size = \"ten\"\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from_file(&config_file),
            Err(ApiError::ConfigError(_))
        ));
    });
}
