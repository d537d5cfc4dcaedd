use crate::config::types::{
    CategoryEntry, Config, CrawlerConfig, ExtractionConfig, OutputConfig, RendererConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_renderer_config(&config.renderer, config.crawler.wait_seconds)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !(0.0..=60.0).contains(&config.wait_seconds) {
        return Err(ConfigError::Validation(format!(
            "wait_seconds must be between 0 and 60, got {}",
            config.wait_seconds
        )));
    }

    if config.max_products_per_page < 1 {
        return Err(ConfigError::Validation(
            "max_products_per_page must be >= 1".to_string(),
        ));
    }

    if config.max_images_per_product < 1 {
        return Err(ConfigError::Validation(
            "max_images_per_product must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the render service settings
fn validate_renderer_config(config: &RendererConfig, wait_seconds: f64) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid renderer endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Renderer endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if (config.timeout_secs as f64) <= wait_seconds {
        return Err(ConfigError::Validation(format!(
            "timeout_secs ({}) must exceed wait_seconds ({})",
            config.timeout_secs, wait_seconds
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.agents.is_empty() {
        return Err(ConfigError::Validation(
            "at least one user agent is required".to_string(),
        ));
    }

    if config.agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user agents cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the markup patterns
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    let patterns = [
        ("product_path", &config.product_path),
        ("image_path", &config.image_path),
        ("next_link_text", &config.next_link_text),
        ("currency_symbol", &config.currency_symbol),
        ("price_style_marker", &config.price_style_marker),
    ];

    for (name, value) in patterns {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidPattern(format!(
                "{} cannot be empty",
                name
            )));
        }
        // Values are spliced into quoted CSS attribute selectors
        if value.contains('"') || value.contains('\\') {
            return Err(ConfigError::InvalidPattern(format!(
                "{} cannot contain quotes or backslashes, got '{}'",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the category list
fn validate_categories(categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category is required".to_string(),
        ));
    }

    for entry in categories {
        let url = Url::parse(&entry.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid category URL '{}': {}", entry.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Category URL '{}' must use http or https",
                entry.url
            )));
        }
    }

    Ok(())
}
