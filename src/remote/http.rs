//! reqwest transport for the gallery REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    image::{ArtifactRef, ImageRecord},
    op::EditOp,
    remote::{
        wire::{CopyBody, CopyResponse, EditedResponse, ImageIdBody, PreviewChainBody, StickerResponse},
        ImageBackend, RemoteError, RemoteResult,
    },
    types::ImageId,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of [`ImageBackend`].
///
/// Token retrieval and refresh are the caller's concern; the backend only
/// attaches whatever bearer token it was handed.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    bearer: Option<String>,
}

impl HttpBackend {
    /// Creates a backend for `{base_url}/api/...`. Trailing slashes on the
    /// base URL are tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            bearer: None,
        }
    }

    /// Attaches a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/{path}", self.base_url))
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = &self.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Network(format!("invalid response: {e}")))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> RemoteResult<T> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Network(format!("invalid response: {e}")))
    }
}

#[async_trait]
impl ImageBackend for HttpBackend {
    async fn fetch_image(&self, id: ImageId) -> RemoteResult<ImageRecord> {
        self.get_json(&format!("api/images/{id}/")).await
    }

    async fn preview_chain(&self, id: ImageId, chain: &[EditOp]) -> RemoteResult<ArtifactRef> {
        let body = PreviewChainBody {
            image_id: id,
            edits: chain,
        };
        let edited: EditedResponse = self.post_json("api/edit/preview_chain/", &body).await?;
        Ok(ArtifactRef::new(edited.edited))
    }

    async fn commit_replace(&self, id: ImageId) -> RemoteResult<()> {
        let path = format!("api/images/{id}/replace/");
        self.send(
            self.request(Method::POST, &path)
                .json(&serde_json::json!({})),
        )
        .await?;
        Ok(())
    }

    async fn create_copy(&self, id: ImageId) -> RemoteResult<ImageId> {
        let body = CopyBody { original_id: id };
        let created: CopyResponse = self.post_json("api/images/copy/", &body).await?;
        Ok(created.id)
    }

    async fn colorize(&self, id: ImageId) -> RemoteResult<ArtifactRef> {
        let body = ImageIdBody { image_id: id };
        let edited: EditedResponse = self.post_json("api/edit/colorize/", &body).await?;
        Ok(ArtifactRef::new(edited.edited))
    }

    async fn preview_sticker(&self, id: ImageId) -> RemoteResult<ArtifactRef> {
        let body = ImageIdBody { image_id: id };
        let sticker: StickerResponse = self.post_json("api/edit/preview_sticker/", &body).await?;
        Ok(ArtifactRef::new(sticker.sticker_url))
    }

    async fn create_sticker(&self, id: ImageId) -> RemoteResult<ArtifactRef> {
        let body = ImageIdBody { image_id: id };
        // The sticker is persisted as a regular upload; its record carries
        // the artifact URL.
        let record: ImageRecord = self.post_json("api/edit/create_sticker/", &body).await?;
        Ok(ArtifactRef::new(record.image))
    }

    async fn delete_image(&self, id: ImageId) -> RemoteResult<()> {
        let path = format!("api/images/{id}/");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn trigger_recluster(&self) -> RemoteResult<()> {
        self.send(self.request(Method::POST, "api/faces/cluster/"))
            .await?;
        Ok(())
    }
}
