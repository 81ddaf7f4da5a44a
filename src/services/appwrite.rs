use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::{Community, CommunityCounters, Meeting, Member, Rating};
use crate::services::store::{DocumentStore, StoreError};

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub accounts: String,
    pub communities: String,
    pub meetings: String,
    pub ratings: String,
}

/// Appwrite database client
///
/// Implements the document store surface the engine needs:
/// - Reading member accounts and communities
/// - Creating and updating meetings
/// - Writing rating stubs and community counters
pub struct AppwriteStore {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

impl AppwriteStore {
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_url(collection),
            urlencoding::encode(document_id)
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
    }

    /// Fetch one document; a 404 is `Ok(None)`
    async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<T>, StoreError> {
        let url = self.document_url(collection, document_id);
        tracing::debug!("Fetching document from: {}", url);

        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let mut doc: Value = ensure_success(response, "fetch document").await?.json().await?;

        // Documents carry their id as `$id`; models expect a plain `id`
        if let Some(obj) = doc.as_object_mut() {
            if !obj.contains_key("id") {
                if let Some(id) = obj.get("$id").cloned() {
                    obj.insert("id".to_string(), id);
                }
            }
        }

        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse {}: {}", collection, e)))
    }

    async fn create_document<T: Serialize>(
        &self,
        collection: &str,
        document_id: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        let url = self.documents_url(collection);
        let payload = json!({
            "documentId": document_id,
            "data": serde_json::to_value(data)?,
        });

        let response = self.request(Method::POST, &url).json(&payload).send().await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(document_id.to_string()));
        }
        ensure_success(response, "create document").await?;

        tracing::debug!("Created document {} in {}", document_id, collection);
        Ok(())
    }

    async fn patch_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: Value,
    ) -> Result<(), StoreError> {
        let url = self.document_url(collection, document_id);

        let response = self
            .request(Method::PATCH, &url)
            .json(&json!({ "data": fields }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(document_id.to_string()));
        }
        ensure_success(response, "update document").await?;

        Ok(())
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read body".to_string());
    tracing::error!("Failed to {}: {} - {}", action, status, body);

    Err(StoreError::Api {
        status: status.as_u16(),
        message: format!("Failed to {}", action),
    })
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn get_member(&self, member_id: &str) -> Result<Option<Member>, StoreError> {
        self.get_document(&self.collections.accounts, member_id).await
    }

    async fn get_community(&self, community_id: &str) -> Result<Option<Community>, StoreError> {
        self.get_document(&self.collections.communities, community_id).await
    }

    async fn update_community_counters(
        &self,
        community_id: &str,
        counters: &CommunityCounters,
    ) -> Result<(), StoreError> {
        self.patch_document(
            &self.collections.communities,
            community_id,
            serde_json::to_value(counters)?,
        )
        .await
    }

    async fn create_meeting(&self, meeting: &Meeting) -> Result<(), StoreError> {
        self.create_document(&self.collections.meetings, &meeting.id, meeting).await
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, StoreError> {
        self.get_document(&self.collections.meetings, meeting_id).await
    }

    async fn update_meeting(&self, meeting: &Meeting) -> Result<(), StoreError> {
        let fields = json!({
            "user_list": meeting.user_list,
            "timestamp": meeting.timestamp,
            "duration": meeting.duration,
            "location": meeting.location,
        });
        self.patch_document(&self.collections.meetings, &meeting.id, fields).await
    }

    async fn create_rating(&self, rating: &Rating) -> Result<(), StoreError> {
        self.create_document(&self.collections.ratings, &rating.meeting_id, rating).await
    }
}
