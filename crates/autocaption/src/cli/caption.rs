//! The `autocaption caption` command: caption local files without the server.

use std::path::PathBuf;
use std::sync::Arc;

use autocaption_core::{
    Autocaption, CaptionLength, CaptionOutput, Config, ConsolePublisher, ProviderFactory,
};
use clap::Args;

use super::types::{OutputFormat, Provider};

/// Arguments for the `caption` command.
#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Image files to caption
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Caption length in tokens (defaults to caption.default_length)
    #[arg(short, long)]
    pub length: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Caption provider (overrides caption.provider)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Model name for the selected provider
    #[arg(long)]
    pub model: Option<String>,
}

/// Execute the caption command.
///
/// Results go to stdout; failures are logged and counted, and the command
/// fails if any file could not be captioned.
pub async fn execute(args: CaptionArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(provider) = args.provider {
        config.caption.provider = provider.to_string();
    }
    let length = match args.length {
        Some(value) => CaptionLength::new(value, &config.caption)?,
        None => CaptionLength::parse(None, &config.caption)?,
    };

    let provider = ProviderFactory::create(
        &config.caption.provider,
        &config.llm,
        args.model.as_deref(),
    )?;
    let app = Autocaption::new(config, provider, Arc::new(ConsolePublisher::stdout())).await?;

    let mut failed = 0usize;
    for input in &args.inputs {
        match app.caption_file(input, length).await {
            Ok(output) => println!("{}", render(&output, args.format)?),
            Err(e) => {
                tracing::error!("Failed to caption {:?}: {e}", input);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} images failed", args.inputs.len());
    }
    Ok(())
}

fn render(output: &CaptionOutput, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => format!(
            "{}\n{}\n{}\n",
            output.file_path.display(),
            output.caption,
            output.hashtags.join(" ")
        ),
        OutputFormat::Jsonl => serde_json::to_string(output)?,
    })
}
