use beacon::services::{EnrichmentClient, InsightFetcher};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";

/// Fetcher whose logo probe and company lookup both go to `server`.
pub fn fetcher_for(server: &MockServer) -> InsightFetcher {
    InsightFetcher::new(EnrichmentClient::new(
        server.uri(),
        server.uri(),
        API_KEY.to_string(),
    ))
}

/// Serves a logo for `domain` with the given status.
pub async fn mount_logo(server: &MockServer, domain: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", domain)))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_bytes(vec![0x89, b'P', b'N', b'G'])
                .insert_header("content-type", "image/png"),
        )
        .mount(server)
        .await;
}

/// Serves the company lookup for `domain`, requiring the bearer token.
pub async fn mount_lookup(server: &MockServer, domain: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/v2/companies/find"))
        .and(query_param("domain", domain))
        .and(header("Authorization", format!("Bearer {}", API_KEY).as_str()))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}
