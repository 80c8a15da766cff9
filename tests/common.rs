//! Common test utilities: pipeline fixtures and a one-shot HTTP responder.
use docflow::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Node ids of the fixture built by [`linear_pipeline`].
#[allow(dead_code)]
pub struct PipelineIds {
    pub input: String,
    pub partition: String,
    pub chunk: String,
    pub output: String,
}

/// Builds `Input -> Partition -> Chunk -> Output`.
#[allow(dead_code)]
pub fn linear_pipeline() -> (Graph, PipelineIds) {
    let mut graph = Graph::new();
    let input = add(&mut graph, NodeKind::Input, 0.0);
    let partition = add(&mut graph, NodeKind::Partition, 200.0);
    let chunk = add(&mut graph, NodeKind::Chunk, 400.0);
    let output = add(&mut graph, NodeKind::Output, 600.0);
    graph.connect(&input, &partition).expect("input -> partition");
    graph.connect(&partition, &chunk).expect("partition -> chunk");
    graph.connect(&chunk, &output).expect("chunk -> output");
    (
        graph,
        PipelineIds {
            input,
            partition,
            chunk,
            output,
        },
    )
}

/// Adds a node of `kind` with its catalog label and returns its id.
#[allow(dead_code)]
pub fn add(graph: &mut Graph, kind: NodeKind, x: f64) -> String {
    graph
        .add_node(kind, descriptor(kind).default_label, Position::new(x, 0.0))
        .id()
        .to_string()
}

/// Checks that every edge references existing nodes through valid sockets and
/// that ids are unique.
#[allow(dead_code)]
pub fn assert_referential_integrity(graph: &Graph) {
    let mut node_ids: Vec<_> = graph.nodes().iter().map(|n| n.id()).collect();
    node_ids.sort_unstable();
    node_ids.dedup();
    assert_eq!(node_ids.len(), graph.nodes().len(), "duplicate node ids");

    let mut edge_ids: Vec<_> = graph.edges().iter().map(|e| e.id.as_str()).collect();
    edge_ids.sort_unstable();
    edge_ids.dedup();
    assert_eq!(edge_ids.len(), graph.edges().len(), "duplicate edge ids");

    for edge in graph.edges() {
        let source = graph
            .node(&edge.source)
            .unwrap_or_else(|| panic!("edge {} has a dangling source", edge.id));
        let target = graph
            .node(&edge.target)
            .unwrap_or_else(|| panic!("edge {} has a dangling target", edge.id));
        assert!(source.kind().sockets().outgoing, "edge {} leaves a sink", edge.id);
        assert!(target.kind().sockets().incoming, "edge {} enters a source", edge.id);
        assert_ne!(edge.source, edge.target, "edge {} is a self-loop", edge.id);
    }
}

/// A server that answers exactly one request with `status` and `body`.
#[allow(dead_code)]
pub struct OneShotServer {
    pub settings: ClientSettings,
    handle: JoinHandle<String>,
}

#[allow(dead_code)]
impl OneShotServer {
    pub fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let port = listener.local_addr().expect("local addr").port();
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).expect("write response");
            stream.flush().expect("flush response");
            request
        });

        let base_url = format!("http://127.0.0.1:{}", port)
            .parse()
            .expect("valid test URL");
        Self {
            settings: ClientSettings::new(base_url)
                .with_timeout(std::time::Duration::from_secs(5)),
            handle,
        }
    }

    /// Waits for the request to be served and returns it as raw text.
    pub fn request(self) -> String {
        self.handle.join().expect("server thread")
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = stream.read(&mut chunk).expect("read request");
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buffer).to_string();
        let Some(header_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let body_len = buffer.len() - (header_end + 4);
        if headers.contains("transfer-encoding: chunked") {
            if text.ends_with("0\r\n\r\n") {
                break;
            }
            continue;
        }
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if body_len >= content_length {
            break;
        }
    }
    String::from_utf8_lossy(&buffer).to_string()
}

/// Settings pointing at a port nothing listens on.
#[allow(dead_code)]
pub fn unreachable_settings() -> ClientSettings {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind throwaway listener");
        listener.local_addr().expect("local addr").port()
    };
    let base_url = format!("http://127.0.0.1:{}", port)
        .parse()
        .expect("valid test URL");
    ClientSettings::new(base_url).with_timeout(std::time::Duration::from_secs(5))
}

/// The body of a raw HTTP request.
#[allow(dead_code)]
pub fn request_body(request: &str) -> &str {
    request
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or_default()
}
