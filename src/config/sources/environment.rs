//! Environment source: CORPUSGEN__SECTION__KEY overrides.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "CORPUSGEN";

/// Add the environment override source. `CORPUSGEN__GENERATION__BATCH_SIZE=20` sets
/// `generation.batch_size`. Single-underscore names such as `CORPUSGEN_LOG` are left to the
/// logging layer.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
