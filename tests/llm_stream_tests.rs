use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use voxcore::services::llm::{ChatModel, LlmService};
use voxcore::EngineError;

/// Answer one request with `status`, sending every piece of `body` as its
/// own HTTP chunk. Returns the base url.
async fn serve_once(status: &'static str, body: Vec<Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
            status
        );
        let _ = socket.write_all(head.as_bytes()).await;
        for piece in body {
            let _ = socket.write_all(format!("{:x}\r\n", piece.len()).as_bytes()).await;
            let _ = socket.write_all(&piece).await;
            let _ = socket.write_all(b"\r\n").await;
            let _ = socket.flush().await;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let _ = socket.write_all(b"0\r\n\r\n").await;
        let _ = socket.flush().await;
    });

    format!("http://{}", addr)
}

async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = socket.read(&mut tmp).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&tmp[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + length {
            return;
        }
    }
}

async fn collect(base_url: &str) -> (anyhow::Result<()>, Vec<String>) {
    let service = LlmService::new(base_url);
    let (tx, mut rx) = mpsc::channel(32);
    let result = service.stream("<|user|>\nhola<|end_of_text|>\n", tx).await;
    let mut fragments = Vec::new();
    while let Ok(fragment) = rx.try_recv() {
        fragments.push(fragment);
    }
    (result, fragments)
}

#[tokio::test]
async fn test_character_split_across_chunks_is_kept_whole() {
    let line = "data: {\"content\":\"España\",\"stop\":true}\n\n".as_bytes().to_vec();
    // Cut between the two bytes of 'ñ'.
    let cut = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
    let url = serve_once("200 OK", vec![line[..cut].to_vec(), line[cut..].to_vec()]).await;

    let (result, fragments) = collect(&url).await;

    result.unwrap();
    assert_eq!(fragments, vec!["España".to_string()]);
}

#[tokio::test]
async fn test_line_split_across_chunks_is_reassembled() {
    let url = serve_once(
        "200 OK",
        vec![b"data: {\"conte".to_vec(), "nt\":\"¿Qué tal?\"}\n\ndata: {\"content\":\" Bien.\"}\n\n".as_bytes().to_vec()],
    )
    .await;

    let (result, fragments) = collect(&url).await;

    result.unwrap();
    assert_eq!(fragments, vec!["¿Qué tal?".to_string(), " Bien.".to_string()]);
}

#[tokio::test]
async fn test_done_and_malformed_lines_are_skipped() {
    let body = "data: {\"content\":\"Hola \"}\n\n: keep-alive\n\ndata: not json\n\ndata: {\"content\":\"tío.\"}\n\ndata: [DONE]\n\n";
    let url = serve_once("200 OK", vec![body.as_bytes().to_vec()]).await;

    let (result, fragments) = collect(&url).await;

    result.unwrap();
    assert_eq!(fragments, vec!["Hola ".to_string(), "tío.".to_string()]);
}

#[tokio::test]
async fn test_stop_flag_ends_generation() {
    let body = "data: {\"content\":\"Fin.\",\"stop\":true}\n\ndata: {\"content\":\"sobra\"}\n\n";
    let url = serve_once("200 OK", vec![body.as_bytes().to_vec()]).await;

    let (result, fragments) = collect(&url).await;

    result.unwrap();
    assert_eq!(fragments, vec!["Fin.".to_string()]);
}

#[tokio::test]
async fn test_trailing_line_without_newline_is_forwarded() {
    let url = serve_once("200 OK", vec![b"data: {\"content\":\"adios\"}".to_vec()]).await;

    let (result, fragments) = collect(&url).await;

    result.unwrap();
    assert_eq!(fragments, vec!["adios".to_string()]);
}

#[tokio::test]
async fn test_error_status_is_a_model_error() {
    let url = serve_once("500 Internal Server Error", vec![]).await;

    let (result, fragments) = collect(&url).await;

    let err = result.unwrap_err();
    assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::Model(_))));
    assert!(fragments.is_empty());
}
