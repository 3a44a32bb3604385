//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key, so a workspace file that only sets
/// `generation.batch_size` keeps every other default.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("provider.model", "gpt-5")?
        .set_default("provider.api_key_env", "OPENAI_API_KEY")?
        .set_default("generation.total_count", 100_i64)?
        .set_default("generation.batch_size", 10_i64)?
        .set_default("generation.output_file", "sentences.txt")?
        .set_default("generation.concurrency", 1_i64)
}
