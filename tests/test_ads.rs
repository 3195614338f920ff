use bibads::{AdsClient, BibAdsError, BibFetcher};
use mockito::Matcher;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_silent_server_times_out() {
    // Accepts connections and never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = AdsClient::new(format!("http://{addr}"))
        .with_timeout(Duration::from_millis(200))
        .unwrap();
    let err = client.fetch("2009MNRAS.399..683J").await.unwrap_err();

    assert!(matches!(err, BibAdsError::Network(ref e) if e.is_timeout()));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_server_error_is_retried_until_success() {
    let mut server = mockito::Server::new_async().await;
    let unavailable = server
        .mock("GET", "/cgi-bin/nph-bib_query")
        .match_query(Matcher::UrlEncoded("bibcode".into(), "2009MNRAS.399..683J".into()))
        .with_status(503)
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/cgi-bin/nph-bib_query")
        .match_query(Matcher::UrlEncoded("bibcode".into(), "2009MNRAS.399..683J".into()))
        .with_status(200)
        .with_body("Retrieved 1 abstracts\n\n@ARTICLE{2009MNRAS.399..683J,\n}\n")
        .expect(1)
        .create_async()
        .await;

    let client = AdsClient::new(server.url()).with_retry(Duration::from_secs(5));
    let entry = client.fetch("2009MNRAS.399..683J").await.unwrap();

    unavailable.assert_async().await;
    ok.assert_async().await;
    assert_eq!(entry, "@ARTICLE{2009MNRAS.399..683J,\n}\n");
}

#[tokio::test]
async fn test_server_error_without_retry_fails_once() {
    let mut server = mockito::Server::new_async().await;
    let unavailable = server
        .mock("GET", "/cgi-bin/nph-bib_query")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let err = AdsClient::new(server.url()).fetch("X").await.unwrap_err();

    unavailable.assert_async().await;
    assert_eq!(err.to_string(), "503 Service Unavailable");
}
