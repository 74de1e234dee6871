use std::sync::Arc;

use serde_json::json;
use stowage_rpc::{HttpClient, MessageStream};
use stowage_uri::Algorithm;
use tracing::{Instrument, Span, debug};

use crate::Result;
use crate::location::{CandidateLocation, FileKey};

pub const FIND_FILE_PATH: &str = "/findFile";

/// Asks the daemon which peers hold a hash.
///
/// Candidates are yielded strictly in the order the daemon sends them.
pub struct Resolver<C> {
    client: Arc<C>,
    span:   Span,
}

impl<C: HttpClient> Resolver<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn client(&self) -> &Arc<C> { &self.client }

    pub async fn find_locations(
        &self,
        hash: &str,
        algorithm: Algorithm,
    ) -> Result<MessageStream<CandidateLocation>> {
        let request = json!({ "fileKey": FileKey::new(algorithm, hash)? });
        async {
            debug!(hash, %algorithm, "looking up candidates");
            Ok(MessageStream::open(self.client.as_ref(), FIND_FILE_PATH, &request).await?)
        }
        .instrument(self.span.clone())
        .await
    }
}
