// Document half of the Firebase backend.
//
// The REST API has no push channel, so `on_snapshot` polls the
// collection and yields only when the set of documents or any document's
// `updateTime` changed. Nothing is read until a user is signed in. The
// first failure is yielded and ends the stream.

use std::sync::Arc;
use std::time::Duration;

use moneyboard_api::{FirestoreClient, FirestoreDocument};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::auth::FirebaseAuth;
use crate::error::CoreError;
use crate::model::Document;
use crate::path::CollectionPath;
use crate::provider::{DocumentStore, SnapshotStream, StoreId};

/// `tokio::time::interval` panics on a zero period.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Document names and update times, in listing order.
type Fingerprint = Vec<(String, Option<String>)>;

fn fingerprint(docs: &[FirestoreDocument]) -> Fingerprint {
    docs.iter()
        .map(|d| (d.name.clone(), d.update_time.clone()))
        .collect()
}

pub struct FirebaseStore {
    id: StoreId,
    client: Arc<FirestoreClient>,
    auth: Arc<FirebaseAuth>,
    poll_interval: Duration,
}

impl FirebaseStore {
    pub fn new(client: Arc<FirestoreClient>, auth: Arc<FirebaseAuth>, poll_interval: Duration) -> Self {
        Self {
            id: StoreId::next(),
            client,
            auth,
            poll_interval,
        }
    }
}

impl DocumentStore for FirebaseStore {
    fn id(&self) -> StoreId {
        self.id
    }

    fn on_snapshot(&self, path: &CollectionPath) -> SnapshotStream {
        let client = Arc::clone(&self.client);
        let auth = Arc::clone(&self.auth);
        let path = path.clone();
        let every = self.poll_interval.max(MIN_POLL_INTERVAL);

        Box::pin(async_stream::stream! {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Fingerprint> = None;

            loop {
                ticker.tick().await;

                let token = match auth.id_token().await {
                    Ok(Some(token)) => token,
                    Ok(None) => {
                        trace!(path = %path, "not signed in yet, skipping read");
                        continue;
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                match client.list_documents(path.as_str(), Some(&token)).await {
                    Ok(docs) => {
                        let current = fingerprint(&docs);
                        if last.as_ref() == Some(&current) {
                            trace!(path = %path, "collection unchanged");
                            continue;
                        }
                        debug!(path = %path, count = docs.len(), "collection changed");
                        last = Some(current);
                        let documents: Vec<Document> = docs.into_iter().map(Document::from).collect();
                        yield Ok(documents);
                    }
                    Err(e) => {
                        yield Err(CoreError::from(e));
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str, updated: &str) -> FirestoreDocument {
        serde_json::from_value(json!({ "name": name, "updateTime": updated })).unwrap()
    }

    #[test]
    fn fingerprint_tracks_updates() {
        let before = fingerprint(&[doc("a", "t1"), doc("b", "t1")]);
        let same = fingerprint(&[doc("a", "t1"), doc("b", "t1")]);
        let edited = fingerprint(&[doc("a", "t2"), doc("b", "t1")]);
        let removed = fingerprint(&[doc("a", "t1")]);

        assert_eq!(before, same);
        assert_ne!(before, edited);
        assert_ne!(before, removed);
    }
}
