use tokio_util::sync::CancellationToken;

use crate::{
    AgentError, AgentRuntime, AgentTarget, QuickAction, Session, TicketContext, build_prompt,
};

/// Where the most recent invocation of an [`AgentClient`] got to.
///
/// `Completed` and `Failed` record the outcome of the last invocation and
/// stay visible until the next one begins. Every invocation first returns
/// the client to `Idle` and then moves through `Sending` and
/// `AwaitingResponse`. A fresh or reset client is `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationPhase {
    Idle,
    Sending,
    AwaitingResponse,
    Completed,
    Failed,
}

/// One conversation with one agent alias.
///
/// The client owns its session id: every [`invoke`](Self::invoke) reuses it
/// so the agent keeps context between turns. Invocation borrows the client
/// mutably and [`reset_session`](Self::reset_session) consumes it, so a
/// reset can never land while a request is still in flight.
#[derive(Debug)]
pub struct AgentClient {
    runtime: AgentRuntime,
    target: AgentTarget,
    session: Session,
    phase: InvocationPhase,
}

impl AgentClient {
    /// Start a new conversation with a freshly generated session.
    pub fn new(runtime: AgentRuntime, target: AgentTarget) -> Self {
        Self {
            runtime,
            target,
            session: Session::generate(),
            phase: InvocationPhase::Idle,
        }
    }

    /// Resume an existing conversation.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn target(&self) -> &AgentTarget {
        &self.target
    }

    pub fn phase(&self) -> InvocationPhase {
        self.phase
    }

    /// Drop the conversation and continue under a new session id.
    pub fn reset_session(self) -> Self {
        let session = Session::generate();
        tracing::debug!(previous = %self.session, session = %session, "Reset agent session");

        Self {
            session,
            phase: InvocationPhase::Idle,
            ..self
        }
    }

    /// Ask the agent something, optionally grounded in a ticket.
    pub async fn invoke(
        &mut self,
        user_input: &str,
        context: Option<&TicketContext>,
    ) -> Result<String, AgentError> {
        self.invoke_with_cancel(user_input, context, &CancellationToken::new())
            .await
    }

    /// Run one of the canned queries against a ticket.
    pub async fn invoke_action(
        &mut self,
        action: QuickAction,
        context: Option<&TicketContext>,
    ) -> Result<String, AgentError> {
        tracing::debug!(action = %action, "Running quick action");
        self.invoke(action.prompt(), context).await
    }

    /// Like [`invoke`](Self::invoke), but gives up with
    /// [`AgentError::Cancelled`] as soon as `cancel` fires.
    pub async fn invoke_with_cancel(
        &mut self,
        user_input: &str,
        context: Option<&TicketContext>,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        if self.phase != InvocationPhase::Idle {
            tracing::trace!(previous = ?self.phase, "Returning to idle");
            self.phase = InvocationPhase::Idle;
        }

        let result = self.run(user_input, context, cancel).await;

        self.phase = match &result {
            Ok(_) => InvocationPhase::Completed,
            Err(error) => {
                tracing::error!(
                    kind = error.kind(),
                    session = %self.session,
                    "Agent invocation failed: {}",
                    error
                );
                InvocationPhase::Failed
            }
        };

        result
    }

    async fn run(
        &mut self,
        user_input: &str,
        context: Option<&TicketContext>,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        self.phase = InvocationPhase::Sending;
        let prompt = build_prompt(user_input, context);
        let request = self
            .runtime
            .sign_request(&self.target, &self.session, &prompt)?;

        let runtime = &self.runtime;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            response = runtime.dispatch(request) => response?,
        };

        self.phase = InvocationPhase::AwaitingResponse;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            completion = runtime.read_completion(response) => completion,
        }
    }
}
