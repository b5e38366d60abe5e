use super::request_executor::{build_headers, build_url};
use super::UpstreamClient;

#[test]
fn test_build_url() {
    let base_url = "https://cloudcode-pa.googleapis.com/v1internal";

    let url1 = build_url(base_url, "generateContent", None);
    assert_eq!(url1, "https://cloudcode-pa.googleapis.com/v1internal:generateContent");

    let url2 = build_url(base_url, "streamGenerateContent", Some("alt=sse"));
    assert_eq!(
        url2,
        "https://cloudcode-pa.googleapis.com/v1internal:streamGenerateContent?alt=sse"
    );
}

#[test]
fn test_headers_carry_bearer_token() {
    let headers = build_headers("ya29.token", "gemini-gateway/test").unwrap_or_default();
    assert_eq!(
        headers.get(reqwest::header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
        Some("Bearer ya29.token")
    );
    assert_eq!(
        headers.get(reqwest::header::USER_AGENT).and_then(|v| v.to_str().ok()),
        Some("gemini-gateway/test")
    );
}

#[test]
fn test_token_with_newline_is_rejected() {
    assert!(build_headers("bad\ntoken", "ua").is_err());
}

#[test]
fn test_trailing_slash_is_trimmed() {
    let client = UpstreamClient::new(reqwest::Client::new(), "http://127.0.0.1:9/v1internal/", "ua");
    assert_eq!(client.base_url(), "http://127.0.0.1:9/v1internal");
}
