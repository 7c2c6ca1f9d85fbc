//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::JoinHandle;

use sm_highlight::grammar::{build_descriptor, parse_grammar};
use sm_highlight::highlight::{Highlighter, HighlighterOptions};

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/samarium.tmLanguage.json")
}

pub fn fixture_json() -> String {
    std::fs::read_to_string(fixture_path()).unwrap()
}

/// Highlighter for the fixture grammar with the given theme
pub fn highlighter(theme: &str) -> Highlighter {
    let grammar = parse_grammar(&fixture_json(), "fixture").unwrap();
    Highlighter::new(HighlighterOptions {
        theme: theme.to_string(),
        langs: vec![build_descriptor(grammar, "samarium", "source.samarium")],
    })
    .unwrap()
}

/// Serve exactly one HTTP response on a local port, returning its URL
pub fn serve_once(status: &str, body: &str) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!(
        "http://{}/samarium.tmLanguage.json",
        listener.local_addr().unwrap()
    );
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4096];
        let mut request = Vec::new();
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
    });

    (url, handle)
}

/// Minimal page with one `<pre class="sm">` per snippet
pub fn page_html(snippets: &[&str]) -> String {
    let blocks: String = snippets
        .iter()
        .map(|s| format!("<pre class=\"sm\">{}</pre>\n", s))
        .collect();
    format!(
        "<!DOCTYPE html>\n<html><head><title>Docs</title></head><body>\n<h1>Docs</h1>\n{}</body></html>\n",
        blocks
    )
}
