use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use matchday_predictor::provider::{ApiFootballClient, FootballProvider, provider_errors};

/// Serves one canned reply per connection, in order, and hands back the raw
/// request head of each connection.
fn stub_server(replies: Vec<(u16, &'static str)>) -> (SocketAddr, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for (status, body) in replies {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut head = String::new();
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line == "\r\n" => break,
                    Ok(_) => head.push_str(&line),
                }
            }
            let _ = tx.send(head);
            let reply = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes());
            let _ = stream.flush();
        }
    });
    (addr, rx)
}

fn listing_params() -> Vec<(&'static str, String)> {
    vec![("league", "39".to_string()), ("status", "NS".to_string())]
}

#[test]
fn sends_key_header_and_query_params() {
    let (addr, requests) = stub_server(vec![(200, r#"{"errors":[],"results":0,"response":[]}"#)]);
    let client = ApiFootballClient::new(format!("http://{addr}/"), "test-key");

    let body = client.fetch("/fixtures", &listing_params()).expect("payload");
    assert_eq!(body["results"], 0);

    let head = requests.recv().expect("request head");
    assert!(
        head.starts_with("GET /fixtures?league=39&status=NS HTTP/1.1"),
        "{head}"
    );
    assert!(
        head.lines()
            .any(|line| line.eq_ignore_ascii_case("x-apisports-key: test-key")),
        "{head}"
    );
}

#[test]
fn non_success_status_is_an_error() {
    let (addr, _requests) = stub_server(vec![(500, r#"{"message":"down"}"#)]);
    let client = ApiFootballClient::new(format!("http://{addr}"), "test-key");

    let err = client
        .fetch("fixtures", &listing_params())
        .expect_err("500 must fail");
    let message = format!("{err:#}");
    assert!(message.contains("http 500"), "{message}");
    assert!(message.contains("down"), "{message}");
}

#[test]
fn provider_errors_on_success_are_returned() {
    let (addr, _requests) = stub_server(vec![
        (500, "{}"),
        (200, r#"{"errors":{"requests":"limit"},"response":[]}"#),
    ]);
    let client = ApiFootballClient::new(format!("http://{addr}"), "test-key");

    assert!(client.fetch("fixtures", &listing_params()).is_err());
    let body = client
        .fetch("fixtures", &listing_params())
        .expect("200 with errors is still a payload");
    let errors = provider_errors(&body).expect("errors field reported");
    assert_eq!(errors["requests"], "limit");
}
