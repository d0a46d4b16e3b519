//! The session state machine.
//!
//! ## Transitions
//!
//! ```text
//!                Start (Idle only)
//!   Idle ─────────────────────────────► Connecting
//!
//!   any ── Pairing ──────────────────► AwaitingPairing   (image + notice)
//!   any ── Opened ───────────────────► Open              (guard cleared)
//!   any ── Closed{logged_out} ───────► AwaitingOperatorConfirm (wipe, guard cleared)
//!   any ── Closed, guard free ───────► Connecting        (one automatic attempt)
//!   any ── Closed, guard held ───────► (dropped)
//!   Connecting ── attempt failed ────► AwaitingOperatorConfirm
//!   AwaitingOperatorConfirm ── token ► Connecting
//! ```
//!
//! Faults never change the state. A critical fault wipes credentials and
//! restarts the process once; later faults are only reported.

use crate::classifier::{classify, matched_keyword, FaultClass};
use crate::commands::OperatorCommand;
use crate::guard::{ReconnectGuard, ReconnectPermit};
use crate::ports::Ports;
use crate::state::{
    ConnectOrigin, ConnectionEvent, Fault, SessionState, SupervisorInput, SupervisorSnapshot,
};
use crate::TransportError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const DEFAULT_CONFIRM_TOKEN: &str = "si";

const PAIRING_CAPTION: &str = "Scan this code to sign in again.";
const PAIRING_NOTICE: &str = "A new sign-in is required. Scan the code above to continue.";
const NO_ACTIVE_SESSION: &str = "There is no active session to log out.";

/// Operator-facing settings.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Reply that authorizes a reconnect while confirmation is pending.
    pub confirm_token: String,
    /// Reminder appended to the "connected" notice.
    pub main_command: Option<String>,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            confirm_token: DEFAULT_CONFIRM_TOKEN.to_string(),
            main_command: None,
        }
    }
}

/// Sole owner of the session state, the reconnect guard and the
/// pending-confirmation flag. Driven one input at a time by the runtime task.
pub struct Supervisor {
    ports: Ports,
    settings: SupervisorSettings,
    state: SessionState,
    pending_confirmation: bool,
    guard: ReconnectGuard,
    escalated: bool,
    inbox: mpsc::WeakUnboundedSender<SupervisorInput>,
}

impl Supervisor {
    pub(crate) fn new(
        ports: Ports,
        settings: SupervisorSettings,
        inbox: mpsc::WeakUnboundedSender<SupervisorInput>,
    ) -> Self {
        Self {
            ports,
            settings,
            state: SessionState::Idle,
            pending_confirmation: false,
            guard: ReconnectGuard::new(),
            escalated: false,
            inbox,
        }
    }

    pub fn snapshot(&self) -> SupervisorSnapshot {
        SupervisorSnapshot {
            state: self.state,
            reconnect_guard_held: self.guard.is_held(),
            pending_confirmation: self.pending_confirmation,
            escalated: self.escalated,
        }
    }

    /// Process one input. Collaborator failures are logged, never returned.
    pub(crate) async fn handle(&mut self, input: SupervisorInput) {
        match input {
            SupervisorInput::Start => self.on_start().await,
            SupervisorInput::Connection(event) => self.on_connection_event(event).await,
            SupervisorInput::Operator(text) => self.on_operator_text(&text).await,
            SupervisorInput::Fault(fault) => self.on_fault(fault).await,
            SupervisorInput::ConnectFinished {
                origin,
                permit,
                result,
            } => self.on_connect_finished(origin, permit, result).await,
            SupervisorInput::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn on_start(&mut self) {
        if self.state != SessionState::Idle {
            debug!(state = %self.state, "Ignoring start; session already initialized");
            return;
        }

        if self.ports.credentials.exists().await {
            info!("Stored credentials found; resuming session");
        } else {
            info!("No stored credentials; transport will request pairing");
        }
        self.begin_connect(ConnectOrigin::Startup, None);
    }

    async fn on_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Pairing { payload } => self.on_pairing(payload).await,
            ConnectionEvent::Opened => self.on_opened().await,
            ConnectionEvent::Closed {
                logged_out: true,
                status_code,
                message,
            } => self.on_logged_out(status_code, &message).await,
            ConnectionEvent::Closed {
                logged_out: false,
                status_code,
                message,
            } => self.on_disconnected(status_code, &message).await,
        }
    }

    async fn on_pairing(&mut self, payload: Vec<u8>) {
        info!(bytes = payload.len(), "Pairing required; forwarding code to operator");

        if let Err(e) = self
            .ports
            .operator
            .send_image(&payload, PAIRING_CAPTION)
            .await
        {
            warn!(error = %e, "Failed to send pairing code to operator");
        }
        self.notify(PAIRING_NOTICE).await;
        self.transition(SessionState::AwaitingPairing);
    }

    async fn on_opened(&mut self) {
        self.transition(SessionState::Open);
        self.guard.clear();
        self.notify(&self.connected_notice()).await;
    }

    async fn on_logged_out(&mut self, status_code: Option<u16>, reason: &str) {
        warn!(?status_code, reason, "Session invalidated by remote; wiping credentials");

        self.wipe_credentials().await;
        self.guard.clear();
        self.transition(SessionState::AwaitingOperatorConfirm);
        self.notify(&format!(
            "Session closed by the remote ({}). A new sign-in is required.\nReply \"{}\" to pair again.",
            reason, self.settings.confirm_token
        ))
        .await;
    }

    async fn on_disconnected(&mut self, status_code: Option<u16>, reason: &str) {
        let Some(permit) = self.guard.try_acquire() else {
            info!(
                ?status_code,
                reason, "Reconnect already in flight; dropping duplicate close"
            );
            return;
        };

        warn!(
            ?status_code,
            reason,
            attempt = permit.attempt(),
            "Connection closed; attempting one automatic reconnect"
        );
        self.begin_connect(ConnectOrigin::Automatic, Some(permit));
        self.notify(&format!("Connection lost ({}). Reconnecting...", reason))
            .await;
    }

    /// Enter `Connecting` and issue one connect call off the supervisor task.
    ///
    /// The outcome comes back as `ConnectFinished`, carrying the permit for
    /// automatic attempts so the guard stays held until it is handled.
    fn begin_connect(&mut self, origin: ConnectOrigin, permit: Option<ReconnectPermit>) {
        self.transition(SessionState::Connecting);

        let Some(inbox) = self.inbox.upgrade() else {
            warn!(origin = origin.as_str(), "Supervisor inbox closed; not connecting");
            return;
        };
        let transport = Arc::clone(&self.ports.transport);

        tokio::spawn(async move {
            let result = transport.connect().await;
            let _ = inbox.send(SupervisorInput::ConnectFinished {
                origin,
                permit,
                result,
            });
        });
    }

    async fn on_connect_finished(
        &mut self,
        origin: ConnectOrigin,
        permit: Option<ReconnectPermit>,
        result: Result<(), TransportError>,
    ) {
        let current = match &permit {
            Some(permit) => permit.is_current(),
            None => self.state == SessionState::Connecting,
        };

        match result {
            Ok(()) => {
                debug!(origin = origin.as_str(), "Connect accepted by transport");
            }
            Err(e) if !current => {
                info!(
                    origin = origin.as_str(),
                    error = %e,
                    "Ignoring failure of superseded connect attempt"
                );
            }
            Err(e) => {
                warn!(
                    origin = origin.as_str(),
                    error = %e,
                    "Connect failed; waiting for operator confirmation"
                );
                self.transition(SessionState::AwaitingOperatorConfirm);
                self.notify(&format!(
                    "Reconnect failed: {}\nReply \"{}\" to try again.",
                    e, self.settings.confirm_token
                ))
                .await;
            }
        }

        drop(permit);
    }

    async fn on_operator_text(&mut self, text: &str) {
        match OperatorCommand::parse(text, &self.settings.confirm_token) {
            OperatorCommand::Confirm => self.on_confirm().await,
            OperatorCommand::Restart => self.on_restart_command().await,
            OperatorCommand::Logout => self.on_logout_command().await,
            OperatorCommand::ForceLogout => self.on_force_logout_command().await,
            OperatorCommand::Other => {
                debug!(state = %self.state, "Ignoring operator text");
            }
        }
    }

    async fn on_confirm(&mut self) {
        if !self.pending_confirmation {
            debug!(state = %self.state, "Confirm token received with nothing pending");
            return;
        }

        info!("Operator confirmed reconnect");
        self.begin_connect(ConnectOrigin::Operator, None);
        self.notify("Reconnecting...").await;
    }

    async fn on_restart_command(&mut self) {
        info!("Operator requested restart");
        self.restart_process().await;
    }

    async fn on_logout_command(&mut self) {
        if !self.state.has_active_session() {
            self.notify(NO_ACTIVE_SESSION).await;
            return;
        }

        info!(state = %self.state, "Operator requested logout");
        if let Err(e) = self.ports.transport.logout().await {
            warn!(error = %e, "Transport logout failed; wiping credentials anyway");
        }
        self.wipe_credentials().await;
        self.guard.clear();
        self.transition(SessionState::AwaitingOperatorConfirm);
        self.notify(&format!(
            "Session closed. Reply \"{}\" to reconnect.",
            self.settings.confirm_token
        ))
        .await;
    }

    async fn on_force_logout_command(&mut self) {
        info!(state = %self.state, "Operator requested forced logout");

        if let Err(e) = self.ports.transport.logout().await {
            warn!(error = %e, "Transport logout failed during forced logout");
        }
        self.wipe_credentials().await;
        self.guard.clear();
        self.transition(SessionState::AwaitingOperatorConfirm);
        self.notify("Session data removed. Restarting the agent...")
            .await;
        self.restart_process().await;
    }

    async fn on_fault(&mut self, fault: Fault) {
        let source = fault.source.as_str();

        match classify(&fault) {
            FaultClass::Transient => {
                warn!(source, message = %fault.message, "Non-critical fault");
                self.notify(&format!("Non-critical fault ({}):\n{}", source, fault.message))
                    .await;
            }
            FaultClass::Critical if self.escalated => {
                warn!(
                    source,
                    message = %fault.message,
                    "Critical fault while escalation already in progress"
                );
                self.notify(&format!(
                    "Critical fault ({}):\n{}\nEscalation already in progress.",
                    source, fault.message
                ))
                .await;
            }
            FaultClass::Critical => {
                self.escalated = true;
                error!(
                    source,
                    message = %fault.message,
                    keyword = ?matched_keyword(&fault.message),
                    "Critical fault; wiping session and restarting"
                );
                self.notify(&format!(
                    "Critical fault ({}):\n{}\nWiping session and restarting...",
                    source, fault.message
                ))
                .await;
                self.wipe_credentials().await;
                self.guard.clear();
                self.restart_process().await;
            }
        }
    }

    async fn restart_process(&self) {
        match self.ports.process.restart().await {
            Ok(()) => {
                info!("Process restart requested");
                self.notify("Restart requested.").await;
            }
            Err(e) => {
                error!(error = %e, "Process restart failed");
                self.notify(&format!("Restart failed: {}", e)).await;
            }
        }
    }

    async fn wipe_credentials(&self) {
        match self.ports.credentials.wipe().await {
            Ok(()) => info!("Stored credentials wiped"),
            Err(e) => error!(error = %e, "Failed to wipe stored credentials"),
        }
    }

    async fn notify(&self, text: &str) {
        if let Err(e) = self.ports.operator.notify(text).await {
            warn!(error = %e, "Failed to notify operator");
        }
    }

    fn connected_notice(&self) -> String {
        match &self.settings.main_command {
            Some(command) => format!("Connected.\nMain command: {}", command),
            None => "Connected.".to_string(),
        }
    }

    /// The only place `state` changes. Pending confirmation tracks
    /// `AwaitingOperatorConfirm` exactly.
    fn transition(&mut self, next: SessionState) {
        if next != self.state {
            info!(from = %self.state, to = %next, "Session state changed");
        }
        self.state = next;
        self.pending_confirmation = next == SessionState::AwaitingOperatorConfirm;
    }
}
