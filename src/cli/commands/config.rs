use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    output_success(
        output_format,
        &format!("Effective configuration ({:?})", config.environment),
        config.redacted(),
    )
}
