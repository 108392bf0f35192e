//! Typed access to the lead endpoints.

use leadgenie_core::types::{Lead, LeadQuery, LeadStats, LeadSubmission, LeadUpdate};
use uuid::Uuid;
use validator::Validate;

use crate::Result;
use crate::http::{ApiClient, ApiRequest, routes};

/// Tracing target for lead operations.
pub const TRACING_TARGET: &str = "leadgenie_client::leads";

/// Lead endpoints over an authorizing [`ApiClient`].
///
/// Every call carries the stored bearer token, so a signed-in session is
/// required. Submissions and patches are validated before any request.
#[derive(Debug, Clone)]
pub struct LeadsClient {
    client: ApiClient,
}

impl LeadsClient {
    /// Creates a lead client over `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Lists leads matching `query`.
    pub async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>> {
        let request = ApiRequest::get(routes::LEADS).with_query(query.to_pairs());
        let leads: Vec<Lead> = self.client.send(request).await?;

        tracing::debug!(target: TRACING_TARGET, count = leads.len(), "Leads listed");
        Ok(leads)
    }

    /// Fetches one lead.
    pub async fn get(&self, id: Uuid) -> Result<Lead> {
        self.client.send(ApiRequest::get(routes::lead(&id))).await
    }

    /// Fetches dashboard aggregates.
    pub async fn stats(&self) -> Result<LeadStats> {
        self.client.send(ApiRequest::get(routes::LEAD_STATS)).await
    }

    /// Stores a lead without scoring it.
    pub async fn create(&self, submission: &LeadSubmission) -> Result<Lead> {
        submission.validate()?;
        let request = ApiRequest::post(routes::LEADS).json(submission)?;
        self.client.send(request).await
    }

    /// Submits a lead for scoring and returns it with the result.
    pub async fn qualify(&self, submission: &LeadSubmission) -> Result<Lead> {
        submission.validate()?;
        let request = ApiRequest::post(routes::LEAD_QUALIFY).json(submission)?;
        let lead: Lead = self.client.send(request).await?;

        tracing::info!(
            target: TRACING_TARGET,
            lead_id = %lead.id,
            score = ?lead.score,
            category = ?lead.category,
            "Lead qualified"
        );
        Ok(lead)
    }

    /// Applies a partial update.
    pub async fn update(&self, id: Uuid, patch: &LeadUpdate) -> Result<Lead> {
        patch.validate()?;
        let request = ApiRequest::put(routes::lead(&id)).json(patch)?;
        self.client.send(request).await
    }

    /// Deletes a lead.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.client.send_unit(ApiRequest::delete(routes::lead(&id))).await?;
        tracing::info!(target: TRACING_TARGET, lead_id = %id, "Lead deleted");
        Ok(())
    }
}
