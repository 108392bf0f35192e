//! Lead types consumed from the `/leads` endpoints.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Temperature bucket assigned by the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeadCategory {
    Hot,
    Warm,
    Cold,
    #[serde(other)]
    Unknown,
}

/// Processing status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LeadStatus {
    New,
    Processing,
    Qualified,
    Contacted,
    Failed,
    Won,
    Lost,
    #[serde(other)]
    Unknown,
}

/// A lead as stored and scored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub category: Option<LeadCategory>,
    /// Score between 0 and 100.
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    /// Explanation of the score.
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub buying_signals: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub next_actions: Vec<String>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_optional")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_optional")]
    pub updated_at: Option<Timestamp>,
}

impl Lead {
    /// Returns `true` once the scoring engine has produced a result.
    pub fn is_scored(&self) -> bool {
        self.score.is_some() && !matches!(self.status, Some(LeadStatus::Processing))
    }
}

/// Body of `POST /leads/qualify`.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LeadSubmission {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub company: Option<String>,

    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

impl LeadSubmission {
    /// Creates a submission without a company.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            email: email.into().trim().to_owned(),
            company: None,
            message: message.into(),
        }
    }

    /// Sets the company.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}

/// Body of `PUT /leads/{id}`. Only the fields that are set are sent.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct LeadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<LeadCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 100))]
    pub score: Option<u8>,
}

/// Sort order for lead listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LeadSort {
    #[default]
    Score,
    CreatedAt,
    Name,
}

/// Filters for `GET /leads`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    pub category: Option<LeadCategory>,
    pub search: Option<String>,
    pub sort_by: LeadSort,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl LeadQuery {
    /// Returns the query string pairs, omitting unset filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("sort_by", self.sort_by.to_string())];

        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            pairs.push(("search", search.to_owned()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }

        pairs
    }
}

/// Aggregates returned by `GET /leads/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadStats {
    #[serde(default)]
    pub total_leads: u64,
    #[serde(default)]
    pub hot_leads: u64,
    #[serde(default)]
    pub warm_leads: u64,
    #[serde(default)]
    pub cold_leads: u64,
    #[serde(default)]
    pub average_score: Option<f64>,
    /// Fields this client does not model yet.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
