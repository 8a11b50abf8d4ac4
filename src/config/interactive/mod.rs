
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, GeminiConfig, WeaviateConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Aven RAG Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Gemini Configuration").bold().yellow());
    eprintln!("Configure the embedding and generation models.");
    eprintln!();
    configure_gemini(&mut config.gemini)?;

    eprintln!();
    eprintln!("{}", style("Weaviate Configuration").bold().yellow());
    eprintln!("Configure the vector database holding the knowledge base.");
    eprintln!();
    configure_weaviate(&mut config.weaviate)?;

    eprintln!();
    let source_path: String = Input::new()
        .with_prompt("Knowledge source file")
        .default(config.knowledge.source_path.display().to_string())
        .interact_text()?;
    config.knowledge.source_path = source_path.into();

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_weaviate_connection(&config.weaviate) {
        eprintln!("{}", style("✓ Weaviate connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Weaviate").yellow()
        );
        eprintln!("You can continue, but make sure Weaviate is reachable before ingesting.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        let config_path = Config::config_file_path().context("Failed to get config file path")?;
        eprintln!(
            "Configuration saved to: {}",
            style(config_path.display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Gemini Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.gemini.base_url).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.gemini.embedding_model).cyan()
    );
    eprintln!(
        "  Generation Model: {}",
        style(&config.gemini.generation_model).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.gemini.batch_size).cyan());
    eprintln!(
        "  Batch Delay: {} ms",
        style(config.gemini.batch_delay_ms).cyan()
    );
    eprintln!(
        "  API Key: {}",
        style(describe_key(config.gemini.resolve_api_key().as_deref())).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Weaviate Settings:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&config.weaviate.endpoint).cyan());
    eprintln!("  Class: {}", style(&config.weaviate.class_name).cyan());
    eprintln!(
        "  API Key: {}",
        style(describe_key(config.weaviate.resolve_api_key().as_deref())).cyan()
    );
    match config.weaviate.base_url() {
        Ok(url) => eprintln!("  Base URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Base URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Knowledge Settings:").bold().yellow());
    eprintln!(
        "  Source: {}",
        style(config.knowledge.source_path.display()).cyan()
    );

    let config_path = Config::config_file_path().context("Failed to get config file path")?;
    eprintln!();
    eprintln!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_gemini(gemini: &mut GeminiConfig) -> Result<()> {
    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(gemini.embedding_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let generation_model: String = Input::new()
        .with_prompt("Generation model")
        .default(gemini.generation_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: usize = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(gemini.batch_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 100 {
                Err("Batch size must be 100 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let api_key: String = Input::new()
        .with_prompt("Gemini API key (leave empty to use GEMINI_API_KEY)")
        .allow_empty(true)
        .default(gemini.api_key.clone().unwrap_or_default())
        .interact_text()?;

    gemini.embedding_model = embedding_model;
    gemini.generation_model = generation_model;
    gemini.batch_size = batch_size;
    gemini.api_key = if api_key.is_empty() {
        None
    } else {
        Some(api_key)
    };

    Ok(())
}

fn configure_weaviate(weaviate: &mut WeaviateConfig) -> Result<()> {
    let endpoint: String = Input::new()
        .with_prompt("Weaviate endpoint (host or full URL)")
        .default(weaviate.endpoint.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Endpoint cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let class_name: String = Input::new()
        .with_prompt("Collection class name")
        .default(weaviate.class_name.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                Ok(())
            } else {
                Err("Class name must start with an uppercase letter")
            }
        })
        .interact_text()?;

    let api_key: String = Input::new()
        .with_prompt("Weaviate API key (leave empty to use WEAVIATE_API_KEY)")
        .allow_empty(true)
        .default(weaviate.api_key.clone().unwrap_or_default())
        .interact_text()?;

    weaviate.endpoint = endpoint;
    weaviate.class_name = class_name;
    weaviate.api_key = if api_key.is_empty() {
        None
    } else {
        Some(api_key)
    };

    Ok(())
}

fn describe_key(key: Option<&str>) -> &'static str {
    if key.is_some() { "configured" } else { "not set" }
}

fn test_weaviate_connection(weaviate: &WeaviateConfig) -> bool {
    let Ok(base_url) = weaviate.base_url() else {
        return false;
    };
    let Ok(url) = base_url.join("/v1/.well-known/ready") else {
        return false;
    };

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(url.as_str()).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => true,
        Err(_) => false,
    }
}
