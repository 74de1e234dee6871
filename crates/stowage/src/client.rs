use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use stowage_fetch::{CandidateLocation, FetchPipeline, Fetched};
use stowage_rpc::{HttpClient, MessageStream, ReqwestClient};
use stowage_store::Store;
use stowage_uri::ContentUri;
use tracing::debug;

use crate::config::{Config, Connectivity};
use crate::facade::StoreFacade;
use crate::{Error, Result};

pub const GET_STATE_PATH: &str = "/getState";
pub const JOIN_SWARM_PATH: &str = "/joinSwarm";
pub const LEAVE_SWARM_PATH: &str = "/leaveSwarm";

/// Entry point for loading, finding and storing content.
///
/// In offline mode only the local store is consulted and the daemon
/// operations fail with [`Error::Offline`].
pub struct Stowage<C = ReqwestClient> {
    store:    Store,
    facade:   StoreFacade<C>,
    pipeline: Option<FetchPipeline<C>>,
    client:   Option<Arc<C>>,
}

impl Stowage<ReqwestClient> {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ReqwestClient::new(&config.daemon_url)?.with_headers(&config.api_headers)?;
        Self::with_client(config, client)
    }
}

impl<C: HttpClient> Stowage<C> {
    pub fn with_client(config: &Config, client: C) -> Result<Self> {
        let store = Store::open(&config.storage_dir)?.with_options(config.store_options());
        let span = tracing::info_span!("stowage", storage = %config.storage_dir.display());

        let (facade, pipeline, client) = match config.connectivity() {
            Connectivity::Offline => (StoreFacade::offline(store.clone()), None, None),
            Connectivity::Daemon => {
                let client = Arc::new(client);
                let facade = StoreFacade::connected(store.clone(), Arc::clone(&client))
                    .with_storage_check(config.check_storage);
                let pipeline = FetchPipeline::new(Arc::clone(&client), store.clone())
                    .with_options(config.fetch_options())
                    .with_span(span.clone());
                (facade, Some(pipeline), Some(client))
            }
        };

        Ok(Self {
            store,
            facade: facade.with_span(span),
            pipeline,
            client,
        })
    }

    pub fn store(&self) -> &Store { &self.store }

    pub fn facade(&self) -> &StoreFacade<C> { &self.facade }

    pub fn is_offline(&self) -> bool { self.client.is_none() }

    fn daemon(&self, operation: &'static str) -> Result<&Arc<C>> {
        self.client.as_ref().ok_or(Error::Offline(operation))
    }

    /// Local path of the object if it is already stored.
    pub fn locate(&self, uri: &ContentUri) -> Option<PathBuf> { self.store.locate(uri.hash(), uri.algorithm()) }

    pub async fn load(&self, uri: &ContentUri) -> Result<Fetched> {
        match &self.pipeline {
            Some(pipeline) => Ok(pipeline.load(uri).await?),
            None => Ok(self.locate(uri).map_or(Fetched::NotFound, Fetched::Found)),
        }
    }

    pub async fn load_bytes(&self, uri: &ContentUri) -> Result<Option<Vec<u8>>> {
        match self.load(uri).await? {
            Fetched::Found(path) => read_file(&path).map(Some),
            Fetched::NotFound => Ok(None),
        }
    }

    pub async fn load_text(&self, uri: &ContentUri) -> Result<Option<String>> {
        match self.load_bytes(uri).await? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn load_json<T: DeserializeOwned>(&self, uri: &ContentUri) -> Result<Option<T>> {
        match self.load_bytes(uri).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Raw stream of candidate locations for `uri`, in daemon order.
    pub async fn find_file(&self, uri: &ContentUri) -> Result<MessageStream<CandidateLocation>> {
        let pipeline = self.pipeline.as_ref().ok_or(Error::Offline("find"))?;
        Ok(pipeline.resolver().find_locations(uri.hash(), uri.algorithm()).await?)
    }

    pub async fn store_file(&self, path: &Path, basename: Option<&str>) -> Result<ContentUri> {
        self.facade.store_file(path, basename).await
    }

    pub async fn store_bytes(&self, data: &[u8], basename: &str) -> Result<ContentUri> {
        self.facade.store_bytes(data, basename).await
    }

    pub async fn store_text(&self, text: &str, basename: Option<&str>) -> Result<ContentUri> {
        self.facade.store_text(text, basename).await
    }

    pub async fn store_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        basename: Option<&str>,
    ) -> Result<ContentUri> {
        self.facade.store_json(value, basename).await
    }

    /// Swarms the daemon currently belongs to, as reported in its state.
    pub async fn swarms(&self) -> Result<Vec<Value>> {
        let mut response = self.call("swarms", GET_STATE_PATH, json!({})).await?;
        match response.pointer_mut("/state/swarms").map(Value::take) {
            Some(Value::Array(swarms)) => Ok(swarms),
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(Error::UnexpectedResponse(format!("swarms is not a list: {other}"))),
        }
    }

    pub async fn join_swarm(&self, name: &str) -> Result<()> {
        self.call("join", JOIN_SWARM_PATH, json!({ "swarmName": name }))
            .await
            .map(drop)
    }

    pub async fn leave_swarm(&self, name: &str) -> Result<()> {
        self.call("leave", LEAVE_SWARM_PATH, json!({ "swarmName": name }))
            .await
            .map(drop)
    }

    async fn call(&self, operation: &'static str, path: &str, body: Value) -> Result<Value> {
        let client = self.daemon(operation)?;
        debug!(path, "daemon call");
        let response = client.post_json(path, &body).await?;
        match response.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(response),
            Some(false) => Err(Error::Daemon(
                response
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            )),
            None => Err(Error::UnexpectedResponse(format!("{path} answered without a success flag"))),
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
