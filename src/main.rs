use clap::Parser;
use form_autofill::cli::commands::{cmd_capture, cmd_detect, cmd_fill, cmd_match};
use form_autofill::cli::config::{Cli, Commands, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    // Resolve Ollama settings: CLI > config > defaults
    let ollama_endpoint = cli.ollama_endpoint.as_deref();
    let ollama_model = cli.ollama_model.as_deref();

    match cli.command {
        Commands::Detect { dom, output } => {
            cmd_detect(&dom, output.as_deref(), &config, cli.verbose)?;
        }
        Commands::Match {
            dom,
            memories,
            backend,
            output,
        } => {
            cmd_match(
                &dom,
                &memories,
                &backend,
                output.as_deref(),
                &config,
                ollama_endpoint,
                ollama_model,
                cli.verbose,
            )?;
        }
        Commands::Fill {
            dom,
            memories,
            backend,
            output,
        } => {
            cmd_fill(
                &dom,
                &memories,
                &backend,
                output.as_deref(),
                &config,
                ollama_endpoint,
                ollama_model,
                cli.verbose,
            )?;
        }
        Commands::Capture { dom, form, store } => {
            cmd_capture(&dom, form.as_deref(), &store, cli.verbose)?;
        }
    }

    Ok(())
}
