use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use futures_util::stream;
use serde::Deserialize;
use serde_json::{Value, json};
use stowage_rpc::{BoxStream, Error, HttpClient, MessageStream, Result, encode_frame};

#[derive(Debug, Deserialize, PartialEq)]
struct Ping {
    n: u32,
}

fn body(chunks: Vec<&'static [u8]>) -> BoxStream<'static, Result<Bytes>> {
    Box::pin(stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c)))))
}

#[derive(Default)]
struct MockClient {
    responses: HashMap<&'static str, (u16, Vec<u8>)>,
}

impl MockClient {
    fn respond(mut self, path: &'static str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(path, (status, body.into()));
        self
    }
}

impl HttpClient for MockClient {
    async fn post_stream(&self, path: &str, _body: &Value) -> Result<BoxStream<'static, Result<Bytes>>> {
        match self.responses.get(path) {
            Some((200, body)) => {
                let chunks: Vec<Result<Bytes>> =
                    body.chunks(3).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            Some((status, body)) => Err(Error::RequestFailed {
                status: *status,
                body:   String::from_utf8_lossy(body).into_owned(),
            }),
            None => Err(Error::RequestFailed {
                status: 404,
                body:   String::new(),
            }),
        }
    }

    async fn post_file(&self, _path: &str, file: &Path) -> Result<Value> {
        let len = std::fs::metadata(file)
            .map_err(|source| Error::Io {
                path: file.to_path_buf(),
                source,
            })?
            .len();
        Ok(json!({ "received": len }))
    }
}

#[tokio::test]
async fn test_messages_in_order() {
    let mut messages = MessageStream::<Ping>::new(body(vec![b"7#{\"n\":1}7#{\"n\"", b":2}", b"7#{\"n\":3}"]));

    assert_eq!(messages.next().await.unwrap(), Some(Ping { n: 1 }));
    assert_eq!(messages.next().await.unwrap(), Some(Ping { n: 2 }));
    assert_eq!(messages.next().await.unwrap(), Some(Ping { n: 3 }));
    assert_eq!(messages.next().await.unwrap(), None);
    assert_eq!(messages.next().await.unwrap(), None);
    assert_eq!(messages.decoded(), 3);
}

#[tokio::test]
async fn test_empty_body_is_end_of_stream() {
    let mut messages = MessageStream::<Ping>::new(body(vec![]));
    assert_eq!(messages.next().await.unwrap(), None);
}

#[tokio::test]
async fn test_truncated_frame_is_framing_error() {
    let mut payload = b"500#".to_vec();
    payload.extend(std::iter::repeat_n(b' ', 300));
    let chunks: Vec<Result<Bytes>> = vec![Ok(Bytes::from(payload))];
    let mut messages = MessageStream::<Value>::new(Box::pin(stream::iter(chunks)));

    let err = messages.next().await.unwrap_err();
    assert!(err.is_framing(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_garbage_prefix_is_framing_error() {
    let mut messages = MessageStream::<Value>::new(body(vec![b"HTTP/1.1 200 OK"]));
    assert!(messages.next().await.unwrap_err().is_framing());
}

#[tokio::test]
async fn test_transport_error_mid_stream() {
    let chunks: Vec<Result<Bytes>> = vec![
        Ok(encode_frame(br#"{"n":1}"#)),
        Err(Error::transport("connection reset")),
    ];
    let mut messages = MessageStream::<Ping>::new(Box::pin(stream::iter(chunks)));

    assert_eq!(messages.next().await.unwrap(), Some(Ping { n: 1 }));
    assert!(matches!(messages.next().await, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_undecodable_message() {
    let mut messages = MessageStream::<Ping>::new(body(vec![b"2#{}"]));
    assert!(matches!(messages.next().await, Err(Error::Json(_))));
}

#[tokio::test]
async fn test_open_surfaces_status_before_frames() {
    let client = MockClient::default().respond("/findFile", 500, "daemon exploded");

    let result = MessageStream::<Ping>::open(&client, "/findFile", &json!({})).await;
    match result {
        Err(Error::RequestFailed { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "daemon exploded");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected RequestFailed"),
    }
}

#[tokio::test]
async fn test_open_streams_frames() {
    let mut framed = encode_frame(br#"{"n":4}"#).to_vec();
    framed.extend_from_slice(&encode_frame(br#"{"n":5}"#));
    let client = MockClient::default().respond("/findFile", 200, framed);

    let mut messages = MessageStream::<Ping>::open(&client, "/findFile", &json!({})).await.unwrap();
    assert_eq!(messages.next().await.unwrap(), Some(Ping { n: 4 }));
    assert_eq!(messages.next().await.unwrap(), Some(Ping { n: 5 }));
    assert_eq!(messages.next().await.unwrap(), None);
}

#[tokio::test]
async fn test_post_json_collects_body() {
    let client = MockClient::default().respond("/getState", 200, r#"{"success":true}"#);

    let value = client.post_json("/getState", &json!({})).await.unwrap();
    assert_eq!(value["success"], true);
}

#[tokio::test]
async fn test_post_file_reports_length() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("upload.bin");
    std::fs::write(&file, [0u8; 42]).unwrap();

    let client = MockClient::default();
    let value = client.post_file("/store", &file).await.unwrap();
    assert_eq!(value["received"], 42);
}
