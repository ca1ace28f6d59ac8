// HTTP client utilities
use crate::domain::error::MtError;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// Create the shared HTTP client. Per-backend timeouts are set on each request.
pub fn create_client(http_proxy: Option<&str>) -> Result<Client, MtError> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("mtrans/", env!("CARGO_PKG_VERSION")));

    if let Some(proxy) = http_proxy.map(str::trim).filter(|p| !p.is_empty()) {
        let proxy = Proxy::all(proxy)
            .map_err(|e| MtError::Config(format!("Invalid http_proxy '{}': {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_without_proxy() {
        assert!(create_client(None).is_ok());
        assert!(create_client(Some("  ")).is_ok());
    }

    #[test]
    fn test_client_with_proxy() {
        assert!(create_client(Some("http://127.0.0.1:8080")).is_ok());
    }
}
