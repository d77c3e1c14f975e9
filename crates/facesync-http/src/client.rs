//! reqwest-backed `FaceClient`.
//!
//! Authentication is a static subscription-key header. Every call goes
//! through [`HttpFaceClient::send`], which maps transport failures and
//! non-success statuses onto [`ClientError`] before any body decoding.

use async_trait::async_trait;
use reqwest::{header, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use facesync_core::client::{
    ClientError, Detection, FaceAttribute, FaceClient, IdentifyResult,
};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OCTET_STREAM: &str = "application/octet-stream";

/// HTTP client for the remote recognition service.
pub struct HttpFaceClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpFaceClient {
    /// Build a client for the given service endpoint and subscription key.
    pub fn new(
        endpoint: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: normalize_endpoint(endpoint),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ClientError::Unavailable(e.to_string()))?;
        check_status(response).await
    }
}

#[async_trait]
impl FaceClient for HttpFaceClient {
    async fn create_group(&self, group_id: &str, name: &str) -> Result<(), ClientError> {
        let request = self
            .http
            .put(self.url(&format!("persongroups/{group_id}")))
            .json(&serde_json::json!({ "name": name }));
        self.send(request).await?;
        Ok(())
    }

    async fn delete_person(&self, group_id: &str, person_id: Uuid) -> Result<(), ClientError> {
        let request = self
            .http
            .delete(self.url(&format!("persongroups/{group_id}/persons/{person_id}")));
        self.send(request).await?;
        Ok(())
    }

    async fn detect(
        &self,
        image: Vec<u8>,
        attributes: &[FaceAttribute],
    ) -> Result<Vec<Detection>, ClientError> {
        let mut request = self
            .http
            .post(self.url("detect"))
            .query(&[("returnFaceId", "true")])
            .header(header::CONTENT_TYPE, OCTET_STREAM)
            .body(image);
        if !attributes.is_empty() {
            request = request.query(&[("returnFaceAttributes", join_attributes(attributes))]);
        }

        let detections: Vec<Detection> = decode(self.send(request).await?).await?;
        tracing::debug!(faces = detections.len(), "detect completed");
        Ok(detections)
    }

    async fn identify(
        &self,
        group_id: &str,
        face_ids: &[Uuid],
        max_candidates: u8,
    ) -> Result<Vec<IdentifyResult>, ClientError> {
        let request = self.http.post(self.url("identify")).json(&serde_json::json!({
            "personGroupId": group_id,
            "faceIds": face_ids,
            "maxNumOfCandidatesReturned": max_candidates,
        }));
        decode(self.send(request).await?).await
    }

    async fn create_person(&self, group_id: &str, name: &str) -> Result<Uuid, ClientError> {
        let request = self
            .http
            .post(self.url(&format!("persongroups/{group_id}/persons")))
            .json(&serde_json::json!({ "name": name }));
        let created: CreatePersonResponse = decode(self.send(request).await?).await?;
        Ok(created.person_id)
    }

    async fn add_person_face(
        &self,
        group_id: &str,
        person_id: Uuid,
        image: Vec<u8>,
    ) -> Result<Uuid, ClientError> {
        let request = self
            .http
            .post(self.url(&format!(
                "persongroups/{group_id}/persons/{person_id}/persistedFaces"
            )))
            .header(header::CONTENT_TYPE, OCTET_STREAM)
            .body(image);
        let added: AddFaceResponse = decode(self.send(request).await?).await?;
        Ok(added.persisted_face_id)
    }

    async fn train_group(&self, group_id: &str) -> Result<(), ClientError> {
        let request = self
            .http
            .post(self.url(&format!("persongroups/{group_id}/train")));
        self.send(request).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePersonResponse {
    person_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFaceResponse {
    persisted_face_id: Uuid,
}

/// Error envelope the service wraps non-success responses in.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

fn join_attributes(attributes: &[FaceAttribute]) -> String {
    attributes
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let (code, message) = parse_error_body(&body);
    Err(classify(status, code, message))
}

fn parse_error_body(body: &str) -> (String, String) {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.code.is_empty() || !parsed.error.message.is_empty() => {
            (parsed.error.code, parsed.error.message)
        }
        _ => (String::new(), body.trim().to_string()),
    }
}

/// Map an HTTP status plus service error code onto the core taxonomy.
fn classify(status: StatusCode, code: String, message: String) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::CONFLICT => ClientError::AlreadyExists,
        StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE
            if code.starts_with("InvalidImage") =>
        {
            ClientError::InvalidImage
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ClientError::Unavailable(format!("{}: {message}", status.as_u16()))
        }
        s if s.is_server_error() => {
            ClientError::Unavailable(format!("{}: {message}", s.as_u16()))
        }
        s => ClientError::Api {
            status: s.as_u16(),
            code,
            message,
        },
    }
}
