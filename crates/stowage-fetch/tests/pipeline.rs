use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use serde_json::{Value, json};
use stowage_fetch::{
    DOWNLOAD_FILE_PATH, Error, FIND_FILE_PATH, FetchOptions, FetchPipeline, Fetched,
};
use stowage_rpc::{BoxStream, HttpClient, encode_frame};
use stowage_store::{Store, StoreOptions};
use stowage_uri::{Algorithm, ContentUri};
use tempfile::tempdir;

const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

enum Download {
    Bytes(Vec<u8>),
    Status(u16),
    Hang,
}

enum Lookup {
    Candidates(Vec<String>),
    Raw(Vec<u8>),
    Status(u16),
}

/// In-process stand-in for the daemon's lookup and download endpoints.
#[derive(Default)]
struct MockDaemon {
    lookups:   HashMap<String, Lookup>,
    downloads: HashMap<String, Download>,
    requests:  Mutex<Vec<String>>,
}

impl MockDaemon {
    fn lookup(mut self, hash: &str, lookup: Lookup) -> Self {
        self.lookups.insert(hash.to_string(), lookup);
        self
    }

    fn node(mut self, node: &str, download: Download) -> Self {
        self.downloads.insert(node.to_string(), download);
        self
    }

    fn requests(&self) -> Vec<String> { self.requests.lock().unwrap().clone() }

    fn frames(&self, hash: &str, nodes: &[String]) -> Vec<u8> {
        let mut body = Vec::new();
        for node in nodes {
            let record = json!({
                "primaryNodeId": node,
                "swarmName": "lab",
                "fileKey": {"sha1": hash},
                "fileInfo": {},
            });
            body.extend_from_slice(&encode_frame(record.to_string().as_bytes()));
        }
        body
    }
}

fn candidates(nodes: &[&str]) -> Lookup { Lookup::Candidates(nodes.iter().map(|n| n.to_string()).collect()) }

fn chunked(body: Vec<u8>) -> BoxStream<'static, stowage_rpc::Result<Bytes>> {
    let chunks: Vec<_> = body.chunks(5).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
    Box::pin(stream::iter(chunks))
}

fn failed(status: u16) -> stowage_rpc::Error {
    stowage_rpc::Error::RequestFailed {
        status,
        body: "unavailable".into(),
    }
}

impl HttpClient for MockDaemon {
    async fn post_stream(
        &self,
        path: &str,
        body: &Value,
    ) -> stowage_rpc::Result<BoxStream<'static, stowage_rpc::Result<Bytes>>> {
        match path {
            FIND_FILE_PATH => {
                let hash = body["fileKey"]["sha1"].as_str().unwrap_or_default().to_string();
                self.requests.lock().unwrap().push(format!("find {hash}"));
                match self.lookups.get(&hash) {
                    Some(Lookup::Candidates(nodes)) => Ok(chunked(self.frames(&hash, nodes))),
                    Some(Lookup::Raw(raw)) => Ok(chunked(raw.clone())),
                    Some(Lookup::Status(status)) => Err(failed(*status)),
                    None => Ok(chunked(Vec::new())),
                }
            }
            DOWNLOAD_FILE_PATH => {
                let node = body["primaryNodeId"].as_str().unwrap_or_default();
                self.requests.lock().unwrap().push(format!("download {node}"));
                match self.downloads.get(node) {
                    Some(Download::Bytes(data)) => Ok(chunked(data.clone())),
                    Some(Download::Status(status)) => Err(failed(*status)),
                    Some(Download::Hang) => Ok(Box::pin(stream::pending())),
                    None => Err(failed(404)),
                }
            }
            other => panic!("unexpected path {other}"),
        }
    }

    async fn post_file(&self, path: &str, _file: &Path) -> stowage_rpc::Result<Value> {
        panic!("unexpected upload to {path}")
    }
}

fn pipeline(daemon: MockDaemon, root: &Path) -> (Arc<MockDaemon>, FetchPipeline<MockDaemon>) {
    let daemon = Arc::new(daemon);
    let store = Store::open(root).unwrap();
    (Arc::clone(&daemon), FetchPipeline::new(daemon, store))
}

fn hello_uri() -> ContentUri { ContentUri::parse(&format!("sha1://{HELLO_SHA1}/greeting.txt")).unwrap() }

#[tokio::test]
async fn test_bad_candidate_is_skipped() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default()
        .lookup(HELLO_SHA1, candidates(&["liar", "honest"]))
        .node("liar", Download::Bytes(b"goodbye".to_vec()))
        .node("honest", Download::Bytes(b"hello".to_vec()));
    let (daemon, pipeline) = pipeline(daemon, dir.path());

    let fetched = pipeline.resolve_and_fetch(&hello_uri()).await.unwrap();

    let path = fetched.into_path().expect("second candidate verifies");
    assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    assert_eq!(
        daemon.requests(),
        vec![format!("find {HELLO_SHA1}"), "download liar".into(), "download honest".into()]
    );
    assert!(pipeline.store().contains(HELLO_SHA1, Algorithm::Sha1));
    assert_eq!(std::fs::read_dir(pipeline.store().staging_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_first_verified_candidate_wins() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default()
        .lookup(HELLO_SHA1, candidates(&["a", "b"]))
        .node("a", Download::Bytes(b"hello".to_vec()))
        .node("b", Download::Bytes(b"hello".to_vec()));
    let (daemon, pipeline) = pipeline(daemon, dir.path());

    assert!(pipeline.resolve_and_fetch(&hello_uri()).await.unwrap().is_found());
    assert!(!daemon.requests().contains(&"download b".to_string()));
}

#[tokio::test]
async fn test_uppercase_hash_is_fetched_and_found_locally() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default()
        .lookup(HELLO_SHA1, candidates(&["honest"]))
        .node("honest", Download::Bytes(b"hello".to_vec()));
    let (daemon, pipeline) = pipeline(daemon, dir.path());
    let uri = ContentUri::parse(&format!("sha1://{}/greeting.txt", HELLO_SHA1.to_ascii_uppercase())).unwrap();

    assert!(pipeline.resolve_and_fetch(&uri).await.unwrap().is_found());
    assert_eq!(daemon.requests(), vec![format!("find {HELLO_SHA1}"), "download honest".into()]);

    let again = pipeline.load(&uri).await.unwrap();
    assert_eq!(std::fs::read(again.path().unwrap()).unwrap(), b"hello");
    assert_eq!(daemon.requests().len(), 2);
}

#[tokio::test]
async fn test_no_candidates_is_not_found() {
    let dir = tempdir().unwrap();
    let (_, pipeline) = pipeline(MockDaemon::default(), dir.path());

    let fetched = pipeline.resolve_and_fetch(&hello_uri()).await.unwrap();
    assert_eq!(fetched, Fetched::NotFound);
}

#[tokio::test]
async fn test_all_candidates_bad_is_not_found() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default()
        .lookup(HELLO_SHA1, candidates(&["liar", "down"]))
        .node("liar", Download::Bytes(b"goodbye".to_vec()))
        .node("down", Download::Status(503));
    let (_, pipeline) = pipeline(daemon, dir.path());

    let fetched = pipeline.resolve_and_fetch(&hello_uri()).await.unwrap();
    assert_eq!(fetched, Fetched::NotFound);
    assert!(!pipeline.store().contains(HELLO_SHA1, Algorithm::Sha1));
}

#[tokio::test]
async fn test_failed_download_moves_on() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default()
        .lookup(HELLO_SHA1, candidates(&["down", "up"]))
        .node("down", Download::Status(500))
        .node("up", Download::Bytes(b"hello".to_vec()));
    let (_, pipeline) = pipeline(daemon, dir.path());

    assert!(pipeline.resolve_and_fetch(&hello_uri()).await.unwrap().is_found());
}

#[tokio::test]
async fn test_stalled_download_times_out() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default()
        .lookup(HELLO_SHA1, candidates(&["stuck", "up"]))
        .node("stuck", Download::Hang)
        .node("up", Download::Bytes(b"hello".to_vec()));
    let (_, pipeline) = pipeline(daemon, dir.path());
    let pipeline =
        pipeline.with_options(FetchOptions::new().download_timeout(Some(Duration::from_millis(50))));

    assert!(pipeline.resolve_and_fetch(&hello_uri()).await.unwrap().is_found());
}

#[tokio::test]
async fn test_lookup_failure_is_surfaced() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default().lookup(HELLO_SHA1, Lookup::Status(500));
    let (_, pipeline) = pipeline(daemon, dir.path());

    let err = pipeline.resolve_and_fetch(&hello_uri()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Rpc(stowage_rpc::Error::RequestFailed { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_framing_error_is_surfaced() {
    let dir = tempdir().unwrap();
    let daemon = MockDaemon::default().lookup(HELLO_SHA1, Lookup::Raw(b"40#{\"truncated\"".to_vec()));
    let (_, pipeline) = pipeline(daemon, dir.path());

    let err = pipeline.resolve_and_fetch(&hello_uri()).await.unwrap_err();
    assert!(matches!(err, Error::Rpc(stowage_rpc::Error::Framing(_))));
}

#[tokio::test]
async fn test_load_prefers_local_copy() {
    let dir = tempdir().unwrap();
    let (daemon, pipeline) = pipeline(MockDaemon::default(), dir.path());
    let committed = pipeline.store().commit_bytes(b"hello", Algorithm::Sha1).unwrap();

    let fetched = pipeline.load(&hello_uri()).await.unwrap();
    assert_eq!(fetched, Fetched::Found(committed.path));
    assert!(daemon.requests().is_empty());
}

#[tokio::test]
async fn test_key_uris_are_unsupported() {
    let dir = tempdir().unwrap();
    let (_, pipeline) = pipeline(MockDaemon::default(), dir.path());
    let uri = ContentUri::parse("key://abcdef").unwrap();

    let err = pipeline.load(&uri).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedAlgorithm(Algorithm::Key)));
}

#[tokio::test]
async fn test_manifest_fallback_reassembles_chunks() {
    let source = tempdir().unwrap();
    let seed = Store::open(source.path())
        .unwrap()
        .with_options(StoreOptions::new().chunk_size(4));
    let data = b"0123456789".to_vec();
    let committed = seed.commit_bytes(&data, Algorithm::Sha1).unwrap();
    let manifest_hash = committed.manifest.clone().unwrap();
    let manifest = seed.read_manifest(&manifest_hash).unwrap();
    let manifest_bytes = std::fs::read(seed.locate(&manifest_hash, Algorithm::Sha1).unwrap()).unwrap();

    let manifest_node = format!("node-{manifest_hash}");
    let mut daemon = MockDaemon::default()
        .lookup(&manifest_hash, candidates(&[manifest_node.as_str()]))
        .node(&manifest_node, Download::Bytes(manifest_bytes));
    for chunk in &manifest.chunks {
        let node = format!("node-{}", chunk.sha1);
        let bytes = data[chunk.start as usize..chunk.end as usize].to_vec();
        daemon = daemon
            .lookup(&chunk.sha1, candidates(&[node.as_str()]))
            .node(&node, Download::Bytes(bytes));
    }

    let dir = tempdir().unwrap();
    let (_, pipeline) = pipeline(daemon, dir.path());
    let uri = ContentUri::new(Algorithm::Sha1, committed.hash.clone()).with_manifest(manifest_hash);

    let path = pipeline.load(&uri).await.unwrap().into_path().unwrap();
    assert_eq!(std::fs::read(path).unwrap(), data);
}

#[tokio::test]
async fn test_manifest_with_missing_chunk_is_not_found() {
    let source = tempdir().unwrap();
    let seed = Store::open(source.path())
        .unwrap()
        .with_options(StoreOptions::new().chunk_size(4));
    let committed = seed.commit_bytes(b"0123456789", Algorithm::Sha1).unwrap();
    let manifest_hash = committed.manifest.clone().unwrap();
    let manifest_bytes = std::fs::read(seed.locate(&manifest_hash, Algorithm::Sha1).unwrap()).unwrap();

    let daemon = MockDaemon::default()
        .lookup(&manifest_hash, candidates(&["m"]))
        .node("m", Download::Bytes(manifest_bytes));
    let dir = tempdir().unwrap();
    let (_, pipeline) = pipeline(daemon, dir.path());
    let uri = ContentUri::new(Algorithm::Sha1, committed.hash).with_manifest(manifest_hash);

    assert_eq!(pipeline.load(&uri).await.unwrap(), Fetched::NotFound);
}
