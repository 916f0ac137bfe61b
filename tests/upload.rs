use std::time::Duration;

use quotation_client::{
    ClientError, DocumentFile, FileSelection, QuotationClient, QuotationResult, ResponseMode,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn files() -> FileSelection {
    FileSelection {
        proposal: Some(DocumentFile::new("proposal.pdf", b"%PDF-1.4 proposal".to_vec())),
        financial: Some(DocumentFile::new(
            "statement.csv",
            b"assets,liabilities\n500000,120000\n".to_vec(),
        )),
    }
}

fn client(server: &MockServer, mode: ResponseMode) -> QuotationClient {
    QuotationClient::new(&server.uri(), mode, Duration::from_secs(10))
}

#[tokio::test]
async fn one_multipart_request_carries_both_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                r#"{"premium":1200.5,"risk_score":0.42,"recommendation":"approve"}"#,
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, ResponseMode::Buffered)
        .submit(&files(), |_| {})
        .await
        .unwrap();
    assert_eq!(
        result,
        QuotationResult {
            premium: 1200.5,
            risk_score: 0.42,
            recommendation: "approve".to_string(),
        }
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="proposal_form"; filename="proposal.pdf""#));
    assert!(body.contains(r#"name="financial_statement"; filename="statement.csv""#));
    assert!(body.contains("%PDF-1.4 proposal"));
    assert!(body.contains("500000,120000"));
}

#[tokio::test]
async fn bad_request_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"detail":"invalid file"}"#))
        .mount(&server)
        .await;

    let err = client(&server, ResponseMode::Buffered)
        .submit(&files(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 400, .. }));
    assert_eq!(err.to_string(), "invalid file");
}

#[tokio::test]
async fn server_error_without_body_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server, ResponseMode::Streaming)
        .submit(&files(), |_| {})
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "An error occurred");
}

#[tokio::test]
async fn streamed_body_yields_progress_and_result() {
    let server = MockServer::start().await;
    let body = concat!(
        "{\"name\":\"extract\",\"progress\":10,\"description\":\"Extracting PII\"}\n",
        "{bad json\n",
        "{\"name\":\"score\",\"progress\":70,\"description\":\"Scoring risk\"}\n",
        "{\"premium\":900,\"risk_score\":0.1,\"recommendation\":\"deny\"}\n",
    );
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let mut names = Vec::new();
    let result = client(&server, ResponseMode::Streaming)
        .submit(&files(), |steps| names.extend(steps.into_iter().map(|s| s.name)))
        .await
        .unwrap();

    assert_eq!(names, vec!["extract".to_string(), "score".to_string()]);
    assert_eq!(result.premium, 900.0);
    assert_eq!(result.recommendation, "deny");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    // Port 9 (discard) is not expected to have an HTTP server listening.
    let client = QuotationClient::new(
        "http://127.0.0.1:9",
        ResponseMode::Buffered,
        Duration::from_secs(5),
    );
    let err = client.submit(&files(), |_| {}).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_) | ClientError::Timeout(_)));
}
