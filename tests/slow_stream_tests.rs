//! Slow but healthy streams are read to their end.

mod common;

use std::time::Duration;

use common::*;
use pretty_assertions::assert_eq;
use switchboard::agent::{ConversationAgent, RequestOutcome, ResponseRequest};
use switchboard::bus::EventBus;
use switchboard::config::AgentConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const WORDS: [&str; 6] = ["one ", "two ", "three ", "four ", "five ", "six"];

/// Serve one chat request as a chunked event stream, pausing `gap` between
/// records.
async fn serve_trickle(listener: TcpListener, gap: Duration) {
    let (mut socket, _) = listener.accept().await.unwrap();
    read_request(&mut socket).await;

    socket
        .write_all(
            b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n",
        )
        .await
        .unwrap();

    let mut records: Vec<String> = WORDS
        .iter()
        .map(|word| format!("data: {}\n\n", text_chunk(word)))
        .collect();
    records.push("data: [DONE]\n\n".to_string());

    for record in records {
        tokio::time::sleep(gap).await;
        let frame = format!("{:x}\r\n{record}\r\n", record.len());
        socket.write_all(frame.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
    }
    socket.write_all(b"0\r\n\r\n").await.unwrap();
    socket.flush().await.unwrap();
}

/// Consume the request head and its `content-length` body.
async fn read_request(socket: &mut TcpStream) {
    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending a request");
        received.extend_from_slice(&buf[..n]);
        if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&received[..head_end]).to_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while received.len() - head_end < body_len {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
}

async fn trickle_agent(
    bus: &EventBus,
    config_for_url: impl Fn(&str) -> AgentConfig,
) -> ConversationAgent {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(serve_trickle(listener, Duration::from_millis(250)));
    ConversationAgent::from_config(bus.clone(), &config_for_url(&url)).unwrap()
}

#[tokio::test]
async fn default_config_reads_a_slow_stream_to_completion() {
    let bus = EventBus::new();
    let recorder = EventRecorder::attach(&bus);
    let agent = trickle_agent(&bus, config_for).await;

    let outcome = agent
        .respond(ResponseRequest::new("count", "ai-slow", TEST_KEY))
        .await;

    assert_eq!(
        outcome,
        RequestOutcome::Completed {
            message_id: "ai-slow".to_string(),
            full_response: WORDS.concat(),
            tool_calls: 0,
        }
    );
    assert_eq!(recorder.chunks("ai-slow"), WORDS.to_vec());
}

#[tokio::test]
async fn connect_timeout_does_not_cut_a_live_stream() {
    let bus = EventBus::new();
    // The stream takes well over a second; only connecting is bounded.
    let agent = trickle_agent(&bus, |url| {
        config_for(url).with_connect_timeout(Duration::from_millis(500))
    })
    .await;

    let outcome = agent
        .respond(ResponseRequest::new("count", "ai-slow", TEST_KEY))
        .await;

    assert!(outcome.is_completed(), "stream was cut: {outcome:?}");
}
