use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Browser access is limited to pages served from the gateway's own host.
/// Programmatic clients don't send preflights.
pub fn cors_layer(port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [format!("http://localhost:{}", port), format!("http://127.0.0.1:{}", port)]
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false)
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_creation() {
        let _layer = cors_layer(8045);
    }
}
