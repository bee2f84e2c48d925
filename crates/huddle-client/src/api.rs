//! Bearer-authenticated REST client.
//!
//! Every call carries `Authorization: Bearer <token>` and is bounded by the
//! configured request timeout. Non-success responses are turned into
//! [`ApiError`] with the backend's `detail` text preserved so the UI can show
//! it verbatim.

use std::path::{Path, PathBuf};

use huddle_proto::{
    ActivityEntry, CreateGroupRequest, Group, GroupId, LoginRequest, LoginResponse, Message,
    NewTask, Notification, ProtocolError, SessionIdentity, SignupRequest, SignupResponse,
    StoredFile, Task, TaskId, TaskUpdate, UserId, codec,
};
use reqwest::{
    Method, RequestBuilder, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    config::{ClientConfig, ConfigError},
    credential::Credential,
};

/// REST errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend rejected the credential. The stored token should be cleared.
    #[error("session rejected by server")]
    Unauthorized,

    /// Backend answered with a non-success status.
    #[error("server returned {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// `detail` from the error body, or the status reason.
        detail: String,
    },

    /// Request did not finish within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Network or HTTP-level failure.
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Protocol(#[from] ProtocolError),

    /// Local file for upload could not be read.
    #[error("cannot read {path}: {source}")]
    File {
        /// File being uploaded.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Endpoint URL could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() { Self::Timeout } else { Self::Http(e) }
    }
}

/// Error body used by the backend: `{"detail": ...}`.
///
/// `detail` is usually a string but validation failures produce a list.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// REST client bound to one backend and one credential.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    credential: Credential,
}

impl ApiClient {
    /// Build a client with the configured timeouts.
    pub fn new(config: ClientConfig, credential: Credential) -> Result<Self, ApiError> {
        let http = http_client(&config)?;
        Ok(Self { http, config, credential })
    }

    /// Backend configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Credential attached to every request.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Exchange email and password for a bearer token.
    ///
    /// Unauthenticated; the backend answers bad credentials with a 400 whose
    /// detail is surfaced as [`ApiError::Status`].
    pub async fn login(
        config: &ClientConfig,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        let http = http_client(config)?;
        let body = LoginRequest { email: email.to_owned(), password: password.to_owned() };
        let response = http.post(config.endpoint("auth/login")?).json(&body).send().await?;
        let response = check(response).await?;
        tracing::info!("login accepted");
        Ok(response.json().await?)
    }

    /// Register a new account. Unauthenticated; the account still has to log
    /// in afterwards.
    pub async fn signup(config: &ClientConfig, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        let http = http_client(config)?;
        let response = http.post(config.endpoint("auth/signup")?).json(request).send().await?;
        let created: SignupResponse = check(response).await?.json().await?;
        tracing::info!(role = ?created.role, "account created");
        Ok(created)
    }

    /// Resolve the session identity.
    ///
    /// Both 401 and 403 mean the token is no longer usable and map to
    /// [`ApiError::Unauthorized`].
    pub async fn me(&self) -> Result<SessionIdentity, ApiError> {
        match self.get_json("auth/me").await {
            Err(ApiError::Status { status: 403, .. }) => Err(ApiError::Unauthorized),
            other => other,
        }
    }

    /// Stored messages of a group, oldest first.
    pub async fn history(&self, group_id: GroupId) -> Result<Vec<Message>, ApiError> {
        let response = self.authorized_get(&format!("chat/{group_id}")).await?;
        let body = response.text().await?;
        let messages = codec::decode_history(&body)?;
        tracing::debug!(group_id, count = messages.len(), "history fetched");
        Ok(messages)
    }

    /// Upload a local file and return its stored descriptor.
    ///
    /// The part is named `file` and carries the file name and a mime type
    /// guessed from the extension. Size and type limits are left to the
    /// backend.
    pub async fn upload(&self, path: &Path) -> Result<StoredFile, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::File { path: path.to_path_buf(), source })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned());
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let size = bytes.len();

        let part = Part::bytes(bytes).file_name(file_name.clone()).mime_str(mime.as_ref())?;
        let form = Form::new().part("file", part);

        let request = self.request(Method::POST, "chat/upload")?.multipart(form);
        let stored: StoredFile = self.send(request).await?.json().await?;

        tracing::info!(file = %file_name, size, url = %stored.file_url, "file uploaded");
        Ok(stored)
    }

    /// Groups visible to this user. Admins see every group.
    pub async fn groups(&self) -> Result<Vec<Group>, ApiError> {
        self.get_json("groups/").await
    }

    /// Create a group with initial members. Admin only on the backend.
    pub async fn create_group(&self, name: &str, members: &[UserId]) -> Result<Group, ApiError> {
        let body = CreateGroupRequest { name: name.to_owned(), members: members.to_vec() };
        let group: Group = self.send_json(Method::POST, "groups/", &body).await?.json().await?;
        tracing::info!(group_id = group.id, name = %group.name, "group created");
        Ok(group)
    }

    /// Delete a group. Admin only on the backend.
    pub async fn delete_group(&self, group_id: GroupId) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("groups/{group_id}"))?).await?;
        tracing::info!(group_id, "group deleted");
        Ok(())
    }

    /// Tasks visible to this user: all of them for admins, otherwise the ones
    /// assigned to the user.
    pub async fn tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.get_json("tasks/").await
    }

    /// Create a task. The server may replace the assignee and the priority.
    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let created: Task = self.send_json(Method::POST, "tasks/", task).await?.json().await?;
        tracing::info!(task_id = created.id, priority = %created.priority, "task created");
        Ok(created)
    }

    /// Apply a partial update. Regular users may only touch their own tasks.
    pub async fn update_task(&self, task_id: TaskId, update: &TaskUpdate) -> Result<(), ApiError> {
        self.send_json(Method::PUT, &format!("tasks/{task_id}"), update).await?;
        tracing::info!(task_id, "task updated");
        Ok(())
    }

    /// Delete a task. Regular users may only delete their own tasks.
    pub async fn delete_task(&self, task_id: TaskId) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("tasks/{task_id}"))?).await?;
        tracing::info!(task_id, "task deleted");
        Ok(())
    }

    /// Reminders derived from the user's tasks.
    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get_json("notifications/").await
    }

    /// Audit trail of one task, oldest first.
    pub async fn activity(&self, task_id: TaskId) -> Result<Vec<ActivityEntry>, ApiError> {
        self.get_json(&format!("activity/{task_id}")).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .http
            .request(method, self.config.endpoint(path)?)
            .header(reqwest::header::AUTHORIZATION, self.credential.bearer()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        check(request.send().await?).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.send(self.request(method, path)?.json(body)).await
    }

    async fn authorized_get(&self, path: &str) -> Result<Response, ApiError> {
        self.send(self.request(Method::GET, path)?).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Ok(self.authorized_get(path).await?.json().await?)
    }
}

fn http_client(config: &ClientConfig) -> Result<reqwest::Client, ApiError> {
    Ok(reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .build()?)
}

/// Pass success responses through, convert everything else into an error.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { detail: serde_json::Value::String(detail) }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_owned(),
    };

    tracing::warn!(status = status.as_u16(), %detail, "request rejected");
    Err(ApiError::Status { status: status.as_u16(), detail })
}
