use crate::config::types::{Config, CrawlerConfig, HttpConfig, ProxyConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_http_config(&config.http)?;
    if let Some(proxy) = &config.proxy {
        validate_proxy_config(proxy)?;
    }
    Ok(())
}

/// Validates crawler configuration
pub(crate) fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 1000 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 1000, got {}",
            config.concurrency
        )));
    }

    if config.pool_item_limit == Some(0) {
        return Err(ConfigError::Validation(
            "pool_item_limit must be >= 1 when set".to_string(),
        ));
    }

    if config.max_crawl_count == Some(0) {
        return Err(ConfigError::Validation(
            "max_crawl_count must be >= 1 when set".to_string(),
        ));
    }

    if config.max_response_size < 1 {
        return Err(ConfigError::Validation(
            "max_response_size must be >= 1 byte".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
pub(crate) fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates HTTP transport configuration
pub(crate) fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout < 1 {
        return Err(ConfigError::Validation("timeout must be >= 1s".to_string()));
    }

    if config.connect_timeout < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout must be >= 1s".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy configuration
pub(crate) fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.ips.is_empty() && config.store_path.is_none() {
        return Err(ConfigError::Validation(
            "proxy configuration needs at least one ip or a store_path".to_string(),
        ));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation(
            "proxy port must be >= 1".to_string(),
        ));
    }

    for ip in &config.ips {
        if ip.trim().is_empty() || ip.contains('/') || ip.contains('@') {
            return Err(ConfigError::Validation(format!(
                "Invalid proxy ip '{}'",
                ip
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
