use std::time::Instant;

use axum::{
    extract::Request,
    http::header::HOST,
    middleware::Next,
    response::Response,
};
use tracing::info;
use uuid::Uuid;

/// Logs every request line and the resulting status with its wall-clock duration.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let url = request_url(&request);
    info!(%request_id, %method, %url, "request");

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    info!(
        %request_id,
        status = response.status().as_u16(),
        elapsed = %format!("{elapsed:.4}s"),
        "response"
    );
    response
}

/// Absolute URL of the request. Origin-form targets are rebuilt from the
/// `Host` header and always reported as `http`.
fn request_url(request: &Request) -> String {
    let uri = request.uri();
    if uri.authority().is_some() {
        return uri.to_string();
    }
    match request.headers().get(HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => format!("http://{host}{uri}"),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http};

    use super::*;

    #[test]
    fn url_includes_host_and_query() {
        let request = http::Request::builder()
            .uri("/versions/scrape?url=x")
            .header(HOST, "api.local:8080")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            request_url(&request),
            "http://api.local:8080/versions/scrape?url=x"
        );
    }

    #[test]
    fn absolute_target_is_kept() {
        let request = http::Request::builder()
            .uri("https://example.com/versions/")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_url(&request), "https://example.com/versions/");
    }

    #[test]
    fn missing_host_falls_back_to_path() {
        let request = http::Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_url(&request), "/healthz");
    }
}
