//! `IntelligenceClient`: the public API consumed by editor frontends.
//!
//! The client owns one logical connection: its status, its transport handle,
//! and its message id sequence. Every request is paired with exactly one
//! reply; a fair async mutex around the session queues concurrent callers in
//! arrival order so at most one request is ever outstanding.

use std::sync::Arc;

use sage_types::{
    AnalysisDepth, CommitGeneration, ConnectionStatus, FileAnalysis, ProjectAnalysis, SimilarCode,
    Suggestion,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::envelope::{self, MessageIdGenerator};
use crate::error::ConnectorError;
use crate::mappers;
use crate::protocol::{
    self, CMD_ANALYZE_CODEBASE, CMD_ANALYZE_FILE, CMD_FIND_SIMILAR_CODE, CMD_GENERATE,
    CMD_GENERATE_COMMIT, CMD_GET_CODE_METRICS, CMD_GET_STATUS, CMD_HEALTH_CHECK,
    TARGET_GIT_SEMANTIC, TARGET_LLM_PROVIDER, TARGET_PYTHON_INTELLIGENCE, TARGET_SYSTEM,
};
use crate::status::StatusTracker;
use crate::suggestions::suggestions_from_text;
use crate::transport::{Dialer, Endpoint, TcpDialer, Transport};

/// Mutable connection state guarded by the call queue.
struct Session {
    endpoint: Endpoint,
    transport: Option<Box<dyn Transport>>,
    ids: MessageIdGenerator,
}

/// Client-side connector to the intelligence backend.
///
/// All methods take `&self`; share the client behind an `Arc` to issue calls
/// from several tasks.
pub struct IntelligenceClient {
    session: Mutex<Session>,
    status: StatusTracker,
    dialer: Arc<dyn Dialer>,
}

impl IntelligenceClient {
    /// Create a disconnected client that dials `endpoint` over TCP.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_dialer(endpoint, Arc::new(TcpDialer))
    }

    #[must_use]
    pub fn with_dialer(endpoint: Endpoint, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            session: Mutex::new(Session {
                endpoint,
                transport: None,
                ids: MessageIdGenerator::default(),
            }),
            status: StatusTracker::new(),
            dialer,
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status.get()
    }

    /// Register an observer for status changes. Observers are append-only
    /// until [`dispose`](Self::dispose).
    pub fn on_status_change<F>(&self, observer: F)
    where
        F: Fn(ConnectionStatus) + Send + Sync + 'static,
    {
        self.status.subscribe(Arc::new(observer));
    }

    pub async fn endpoint(&self) -> Endpoint {
        self.session.lock().await.endpoint.clone()
    }

    fn transition(&self, next: ConnectionStatus) {
        if let Err(e) = self.status.set(next) {
            tracing::warn!("{e}");
        }
    }

    /// Dial the backend and verify it with a health check.
    ///
    /// A no-op when already connected. On failure the status is `error` and
    /// no transport is retained.
    pub async fn connect(&self) -> Result<(), ConnectorError> {
        let mut session = self.session.lock().await;
        self.connect_locked(&mut session).await
    }

    async fn connect_locked(&self, session: &mut Session) -> Result<(), ConnectorError> {
        if session.transport.is_some() && self.status.get().is_connected() {
            return Ok(());
        }

        self.transition(ConnectionStatus::Connecting);
        tracing::info!(endpoint = %session.endpoint, "Connecting to intelligence backend...");

        let attempt = {
            let mut pending = InFlight::new(session, &self.status);
            let dialed = self.dialer.dial(&pending.session.endpoint).await;
            match dialed {
                Ok(transport) => {
                    pending.session.transport = Some(transport);
                    let checked = pending
                        .run(TARGET_SYSTEM, CMD_HEALTH_CHECK, Map::new())
                        .await;
                    checked
                        .map(|_| ())
                        .map_err(|e| ConnectorError::connection(&pending.session.endpoint, e))
                }
                Err(e) => {
                    pending.settled = true;
                    Err(ConnectorError::connection(&pending.session.endpoint, e))
                }
            }
        };

        match attempt {
            Ok(()) => {
                self.transition(ConnectionStatus::Connected);
                tracing::info!(endpoint = %session.endpoint, "Connected to intelligence backend");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(endpoint = %session.endpoint, "Connection attempt failed: {e}");
                if let Some(mut transport) = session.transport.take() {
                    close_transport(&mut *transport).await;
                }
                self.transition(ConnectionStatus::Error);
                Err(e)
            }
        }
    }

    /// Close the transport (if any) and move to `disconnected`.
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        self.disconnect_locked(&mut session).await;
    }

    async fn disconnect_locked(&self, session: &mut Session) {
        if let Some(mut transport) = session.transport.take() {
            close_transport(&mut *transport).await;
            tracing::info!(endpoint = %session.endpoint, "Disconnected from intelligence backend");
        }
        self.transition(ConnectionStatus::Disconnected);
    }

    /// Point the client at a new address.
    ///
    /// While connected this disconnects and reconnects as two separate steps.
    /// A failed reconnect keeps the new address and leaves the status at
    /// `error`; the previous address is not restored.
    pub async fn update_server_url(&self, address: &str) -> Result<(), ConnectorError> {
        let endpoint =
            Endpoint::parse(address).map_err(|e| ConnectorError::connection(address.trim(), e))?;

        let mut session = self.session.lock().await;
        if session.endpoint == endpoint {
            return Ok(());
        }
        tracing::info!(from = %session.endpoint, to = %endpoint, "Server address changed");

        if self.status.get().is_connected() {
            self.disconnect_locked(&mut session).await;
            session.endpoint = endpoint;
            self.connect_locked(&mut session).await
        } else {
            session.endpoint = endpoint;
            Ok(())
        }
    }

    /// Tear down: close the transport and drop every status observer.
    pub async fn dispose(&self) {
        let mut session = self.session.lock().await;
        if session.transport.is_some() {
            self.disconnect_locked(&mut session).await;
        }
        self.status.clear_observers();
    }

    /// Raw dispatcher: send one command to `target` and await its reply.
    ///
    /// Fails with [`ConnectorError::NotConnected`] before any I/O when there
    /// is no live connection. A transport failure or a reply answering some
    /// other request drops the transport and moves the status to `error`.
    /// Cancelling the returned future after the request was sent does the
    /// same. No retries.
    pub async fn call(
        &self,
        target: &str,
        command: &str,
        params: Map<String, Value>,
    ) -> Result<Map<String, Value>, ConnectorError> {
        let mut session = self.session.lock().await;
        if !self.status.get().is_connected() {
            return Err(ConnectorError::NotConnected);
        }

        let mut pending = InFlight::new(&mut session, &self.status);
        let result = pending.run(target, command, params).await;
        if let Err(e) = &result
            && e.breaks_connection()
        {
            tracing::warn!(dest = target, command, kind = e.kind(), "Dropping connection: {e}");
            pending.abandon();
        }
        result
    }

    /// Backend liveness check; never fails, any error maps to `false`.
    pub async fn health_check(&self) -> bool {
        match self
            .call(TARGET_SYSTEM, CMD_HEALTH_CHECK, Map::new())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(kind = e.kind(), "Health check failed: {e}");
                false
            }
        }
    }

    pub async fn analyze_file(&self, file_path: &str, depth: AnalysisDepth) -> Option<FileAnalysis> {
        let payload = degrade(
            CMD_ANALYZE_FILE,
            self.call(
                TARGET_PYTHON_INTELLIGENCE,
                CMD_ANALYZE_FILE,
                protocol::analyze_file_params(file_path, depth),
            )
            .await,
        )?;
        Some(mappers::map_file_analysis(file_path, &payload))
    }

    /// Analyze a file and return its derived suggestions as records.
    pub async fn file_suggestions(&self, file_path: &str, depth: AnalysisDepth) -> Vec<Suggestion> {
        self.analyze_file(file_path, depth)
            .await
            .map(|analysis| suggestions_from_text(&analysis.suggestions, Some(&analysis.file_path)))
            .unwrap_or_default()
    }

    /// `analyze_codebase` then `get_code_metrics`, merged. The second call is
    /// only issued when the first succeeds.
    pub async fn analyze_project(&self, project_path: &str) -> Option<ProjectAnalysis> {
        let codebase = degrade(
            CMD_ANALYZE_CODEBASE,
            self.call(
                TARGET_PYTHON_INTELLIGENCE,
                CMD_ANALYZE_CODEBASE,
                protocol::project_params(project_path),
            )
            .await,
        )?;
        let metrics = degrade(
            CMD_GET_CODE_METRICS,
            self.call(
                TARGET_PYTHON_INTELLIGENCE,
                CMD_GET_CODE_METRICS,
                protocol::project_params(project_path),
            )
            .await,
        )?;
        Some(mappers::map_project_analysis(project_path, &codebase, &metrics))
    }

    pub async fn generate_commit(&self, repository_path: Option<&str>) -> Option<CommitGeneration> {
        let payload = degrade(
            CMD_GENERATE_COMMIT,
            self.call(
                TARGET_GIT_SEMANTIC,
                CMD_GENERATE_COMMIT,
                protocol::generate_commit_params(repository_path),
            )
            .await,
        )?;
        Some(mappers::map_commit_generation(&payload))
    }

    pub async fn ask_question(&self, question: &str, context: Option<&str>) -> Option<String> {
        let payload = degrade(
            CMD_GENERATE,
            self.call(
                TARGET_LLM_PROVIDER,
                CMD_GENERATE,
                protocol::generate_params(question, context),
            )
            .await,
        )?;
        mappers::map_generated_content(&payload)
    }

    pub async fn search_similar_code(&self, code_snippet: &str, limit: usize) -> Vec<SimilarCode> {
        degrade(
            CMD_FIND_SIMILAR_CODE,
            self.call(
                TARGET_PYTHON_INTELLIGENCE,
                CMD_FIND_SIMILAR_CODE,
                protocol::find_similar_params(code_snippet, limit),
            )
            .await,
        )
        .map(|payload| mappers::map_similar_code(&payload))
        .unwrap_or_default()
    }

    pub async fn get_system_status(&self) -> Map<String, Value> {
        degrade(
            CMD_GET_STATUS,
            self.call(TARGET_SYSTEM, CMD_GET_STATUS, Map::new()).await,
        )
        .map(|payload| mappers::map_system_status(&payload))
        .unwrap_or_default()
    }
}

/// A request on the session's transport whose reply has not been read yet.
///
/// Dropped before it settles (the caller's future was cancelled), it takes
/// the transport down with it: the unread reply would otherwise be handed to
/// the next request.
struct InFlight<'a> {
    session: &'a mut Session,
    status: &'a StatusTracker,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a mut Session, status: &'a StatusTracker) -> Self {
        Self {
            session,
            status,
            settled: false,
        }
    }

    async fn run(
        &mut self,
        target: &str,
        command: &str,
        params: Map<String, Value>,
    ) -> Result<Map<String, Value>, ConnectorError> {
        let session = &mut *self.session;
        let Some(transport) = session.transport.as_deref_mut() else {
            self.settled = true;
            return Err(ConnectorError::NotConnected);
        };
        let result = exchange(transport, &mut session.ids, target, command, params).await;
        self.settled = true;
        result
    }

    /// Drop the transport without closing it and move to `error`.
    fn abandon(&mut self) {
        self.session.transport = None;
        if let Err(e) = self.status.set(ConnectionStatus::Error) {
            tracing::warn!("{e}");
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                endpoint = %self.session.endpoint,
                "Request cancelled before its reply arrived, dropping connection"
            );
            self.abandon();
        }
    }
}

/// One request, one reply. Does not touch connection status.
async fn exchange(
    transport: &mut dyn Transport,
    ids: &mut MessageIdGenerator,
    target: &str,
    command: &str,
    params: Map<String, Value>,
) -> Result<Map<String, Value>, ConnectorError> {
    let now = envelope::now_millis();
    let request = envelope::build_command(ids.next_id(now), target, command, params, now);
    let frame = envelope::encode(&request)?;

    tracing::debug!(id = %request.id, dest = target, command, "Sending command");
    transport.send(&frame).await?;
    let reply = envelope::decode_reply(&transport.recv().await?)?;

    if let Some(correlation_id) = reply.correlation_id.as_deref()
        && correlation_id != request.id
    {
        return Err(ConnectorError::Desync {
            request: request.id,
            reply: correlation_id.to_string(),
        });
    }
    tracing::trace!(id = %request.id, success = reply.succeeded(), "Reply received");
    envelope::into_payload(reply)
}

async fn close_transport(transport: &mut dyn Transport) {
    if let Err(e) = transport.close().await {
        tracing::warn!("Error closing transport: {e}");
    }
}

/// Typed-operation error policy: log and swallow.
fn degrade<T>(operation: &str, result: Result<T, ConnectorError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(operation, kind = e.kind(), "Intelligence request failed: {e}");
            None
        }
    }
}
