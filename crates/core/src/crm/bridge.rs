//! Turns a freshly stored quote into a prospect and a draft proposal.
//!
//! The bridge runs after the quote is committed and reports through
//! [`FollowUpOutcome`] instead of `Result`: a failed bridge leaves the quote
//! untouched and is only visible on the audit channel and in the logs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use crate::cpq::catalog::{RateCatalog, RateSnapshot};
use crate::crm::{ClientCollaborator, ProposalCollaborator};
use crate::domain::client::{ClientId, NewClient};
use crate::domain::proposal::{LineItem, NewProposal, ProposalId, ProposalStatus};
use crate::domain::quote::Quote;
use crate::domain::rate::ServiceFrequency;
use crate::errors::{ApplicationError, DomainError};

const ACTOR: &str = "quote-crm-bridge";
const PROSPECT_SOURCE: &str = "quote_generator";

pub trait QuoteFollowUp: Send + Sync {
    fn after_commit(&self, quote: &Quote) -> FollowUpOutcome;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStage {
    Validation,
    Prospect,
    Proposal,
}

impl BridgeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Prospect => "prospect",
            Self::Proposal => "proposal",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FollowUpOutcome {
    Linked { prospect_id: ClientId, proposal_id: ProposalId },
    Failed { stage: BridgeStage, error: ApplicationError },
}

pub struct QuoteCrmBridge {
    catalog: Arc<RateCatalog>,
    clients: Arc<dyn ClientCollaborator>,
    proposals: Arc<dyn ProposalCollaborator>,
    audit: Arc<dyn AuditSink>,
}

impl QuoteCrmBridge {
    pub fn new(
        catalog: Arc<RateCatalog>,
        clients: Arc<dyn ClientCollaborator>,
        proposals: Arc<dyn ProposalCollaborator>,
    ) -> Self {
        Self { catalog, clients, proposals, audit: Arc::new(NoopAuditSink) }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    fn link(&self, quote: &Quote) -> Result<(ClientId, ProposalId), (BridgeStage, ApplicationError)> {
        let frequency = quote.service_frequency.ok_or_else(|| {
            let error = DomainError::Validation(
                "serviceFrequency is required to create a prospect".to_owned(),
            );
            (BridgeStage::Validation, ApplicationError::from(error))
        })?;

        let rates = self.catalog.snapshot().map_err(|error| (BridgeStage::Prospect, error))?;
        let notes = quote_summary(quote, frequency, &rates);

        match self.clients.find_by_email(&quote.customer_email) {
            Ok(Some(existing)) => info!(
                event_name = "bridge.existing_client",
                quote_id = %quote.id,
                client_id = %existing.id,
                "quote email matches an existing client; creating a separate prospect"
            ),
            Ok(None) => {}
            Err(error) => return Err((BridgeStage::Prospect, error)),
        }

        let prospect = self
            .clients
            .create_prospect(NewClient {
                name: quote.customer_name.clone(),
                email: quote.customer_email.clone(),
                phone: quote.customer_phone.clone().unwrap_or_default(),
                status: None,
                source: Some(PROSPECT_SOURCE.to_owned()),
                notes: Some(notes.clone()),
            })
            .map_err(|error| (BridgeStage::Prospect, error))?;

        let proposal = self
            .proposals
            .create(NewProposal {
                client_id: prospect.id,
                title: format!("{} Cleaning Proposal", frequency.label()),
                status: ProposalStatus::Draft,
                line_items: line_items(quote, frequency, &rates),
                notes,
                source_quote_id: Some(quote.id),
            })
            .map_err(|error| (BridgeStage::Proposal, error))?;

        Ok((prospect.id, proposal.id))
    }
}

impl QuoteFollowUp for QuoteCrmBridge {
    fn after_commit(&self, quote: &Quote) -> FollowUpOutcome {
        match self.link(quote) {
            Ok((prospect_id, proposal_id)) => {
                info!(
                    event_name = "bridge.linked",
                    quote_id = %quote.id,
                    prospect_id = %prospect_id,
                    proposal_id = %proposal_id,
                    "quote linked to prospect and draft proposal"
                );
                self.audit.emit(
                    AuditEvent::new(
                        Some(quote.id),
                        "bridge.linked",
                        AuditCategory::Bridge,
                        ACTOR,
                        AuditOutcome::Success,
                    )
                    .with_metadata("prospect_id", prospect_id.to_string())
                    .with_metadata("proposal_id", proposal_id.to_string()),
                );
                FollowUpOutcome::Linked { prospect_id, proposal_id }
            }
            Err((stage, error)) => {
                warn!(
                    event_name = "bridge.failed",
                    quote_id = %quote.id,
                    stage = stage.as_str(),
                    error = %error,
                    "quote bridge failed; quote kept without prospect"
                );
                self.audit.emit(
                    AuditEvent::new(
                        Some(quote.id),
                        "bridge.failed",
                        AuditCategory::Bridge,
                        ACTOR,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("stage", stage.as_str())
                    .with_metadata("error", error.to_string()),
                );
                FollowUpOutcome::Failed { stage, error }
            }
        }
    }
}

/// `Quote #<id>: <Frequency> cleaning for <sqft> sq ft. Add-ons: <labels>. Estimated total: $<total>`
pub fn quote_summary(quote: &Quote, frequency: ServiceFrequency, rates: &RateSnapshot) -> String {
    let labels = quote
        .request()
        .unique_add_ons()
        .into_iter()
        .map(|key| match rates.surcharge_for_key(key) {
            Some(surcharge) => surcharge.entry.name.clone(),
            None => humanize_add_on(key),
        })
        .collect::<Vec<_>>();
    let add_ons = if labels.is_empty() { "None".to_owned() } else { labels.join(", ") };

    format!(
        "Quote #{}: {} cleaning for {} sq ft. Add-ons: {}. Estimated total: ${:.2}",
        quote.id,
        frequency.label(),
        quote.square_footage,
        add_ons,
        quote.pricing.total_price
    )
}

/// Base service first, then one item per add-on that still resolves to an
/// active surcharge, priced at the surcharge's catalog value.
fn line_items(quote: &Quote, frequency: ServiceFrequency, rates: &RateSnapshot) -> Vec<LineItem> {
    let mut items = vec![LineItem {
        id: 1,
        service: format!("{} Cleaning Service", frequency.label()),
        price: quote.pricing.base_price,
    }];
    for key in quote.request().unique_add_ons() {
        if let Some(surcharge) = rates.surcharge_for_key(key) {
            items.push(LineItem {
                id: items.len() as u32 + 1,
                service: surcharge.entry.name.clone(),
                price: surcharge.value,
            });
        }
    }
    items
}

/// `petHairCleanup` -> `Pet Hair Cleanup`.
pub fn humanize_add_on(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (index, ch) in key.trim().chars().enumerate() {
        if index == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            label.push(' ');
            label.push(ch);
        } else {
            label.push(ch);
        }
    }
    label
}
