use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    api::{ApiRequest, AuthHeaders, Endpoints, Transport, TransportError},
    catalog::Catalog,
    model::MatchContext
};

const INSTALOCK_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The service answered; whether it accepted is up to the game.
    Sent { status: u16 },
    /// Not in a match, nothing was sent.
    Skipped
}

/// Fire-and-forget agent-select calls. No retries.
pub struct ActionInvoker<R> {
    transport: R,
    endpoints: Endpoints
}

impl<R: Transport> ActionInvoker<R> {
    pub fn new(transport: R, endpoints: Endpoints) -> Self {
        ActionInvoker { transport, endpoints }
    }

    pub async fn dodge(&self, context: &MatchContext, headers: &AuthHeaders) -> Result<ActionOutcome, TransportError> {
        let Some(match_id) = current_match(context, "dodge") else {
            return Ok(ActionOutcome::Skipped);
        };
        self.post(self.endpoints.pregame_quit(match_id), headers).await
    }

    pub async fn select_agent(
        &self,
        context: &MatchContext,
        headers: &AuthHeaders,
        agent_id: &str
    ) -> Result<ActionOutcome, TransportError> {
        let Some(match_id) = current_match(context, "select agent") else {
            return Ok(ActionOutcome::Skipped);
        };
        self.post(self.endpoints.pregame_select(match_id, agent_id), headers).await
    }

    pub async fn lock_agent(
        &self,
        context: &MatchContext,
        headers: &AuthHeaders,
        agent_id: &str
    ) -> Result<ActionOutcome, TransportError> {
        let Some(match_id) = current_match(context, "lock agent") else {
            return Ok(ActionOutcome::Skipped);
        };
        self.post(self.endpoints.pregame_lock(match_id, agent_id), headers).await
    }

    /// Select, wait briefly, then lock.
    pub async fn instalock(
        &self,
        context: &MatchContext,
        headers: &AuthHeaders,
        agent_id: &str
    ) -> Result<ActionOutcome, TransportError> {
        if let ActionOutcome::Skipped = self.select_agent(context, headers, agent_id).await? {
            return Ok(ActionOutcome::Skipped);
        }
        sleep(INSTALOCK_PAUSE).await;
        self.lock_agent(context, headers, agent_id).await
    }

    async fn post(&self, url: String, headers: &AuthHeaders) -> Result<ActionOutcome, TransportError> {
        let response = self.transport.send(ApiRequest::post(url.clone()).auth(headers)).await?;
        info!(url = %url, status = response.status, "action sent");
        Ok(ActionOutcome::Sent {
            status: response.status
        })
    }
}

fn current_match<'a>(context: &'a MatchContext, action: &str) -> Option<&'a str> {
    match context.match_id.as_deref() {
        Some(match_id) if context.phase.in_match() => Some(match_id),
        _ => {
            warn!(action, "not in a match, skipping");
            None
        }
    }
}

/// Accepts an agent id or display name, case-insensitively.
pub fn resolve_agent(catalog: &Catalog, agent: &str) -> Option<String> {
    if catalog.agent_name(agent).is_some() {
        return Some(agent.trim().to_lowercase());
    }
    catalog.agent_id(agent).map(str::to_owned)
}
