//! HTTP traffic of the configured generative fallback

use mise_cli::config::OllamaSettings;
use mise_domain::{FieldName, Segment};
use mise_extractor::{ExtractorConfig, GenerativeFallback};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const FAILURE: &[u8] =
    b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Read one request off the wire
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(())
}

/// Ollama stand-in that answers every request with a 500
async fn failing_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                if read_request(&mut stream).await.is_ok() {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let _ = stream.write_all(FAILURE).await;
                    let _ = stream.shutdown().await;
                }
            });
        }
    });

    (format!("http://{}", addr), hits)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_segment_costs_two_requests() {
    let (endpoint, hits) = failing_server().await;
    let settings = OllamaSettings {
        endpoint,
        model: "llama3.1".into(),
    };

    let provider = Arc::new(settings.fallback_provider());
    let fallback = GenerativeFallback::new(provider, &ExtractorConfig::default());
    let segment = Segment::standalone("Brot\n500 g Mehl");
    let result = fallback.complete(&segment, &[FieldName::Title]).await;

    assert!(result.is_err());
    // the first attempt plus the fallback's own retry
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
