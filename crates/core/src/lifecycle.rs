use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use crate::cpq::catalog::RateCatalog;
use crate::cpq::pricing::{DeterministicPricingEngine, PricingEngine, PricingResult};
use crate::crm::bridge::{FollowUpOutcome, QuoteFollowUp};
use crate::domain::quote::{Quote, QuoteDraft, QuoteId, QuotePatch, QuoteRequest, QuoteStatus};
use crate::errors::{ApplicationError, DomainError};
use crate::store::Repository;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

const ACTOR: &str = "quote-lifecycle";

/// Owns quote records and keeps their priced fields in step with the
/// pricing-relevant inputs.
pub struct QuoteLifecycleManager {
    quotes: Arc<dyn Repository<Quote>>,
    catalog: Arc<RateCatalog>,
    pricing: Arc<dyn PricingEngine>,
    follow_up: Option<Arc<dyn QuoteFollowUp>>,
    audit: Arc<dyn AuditSink>,
    recent_limit: usize,
}

impl QuoteLifecycleManager {
    pub fn new(quotes: Arc<dyn Repository<Quote>>, catalog: Arc<RateCatalog>) -> Self {
        Self {
            quotes,
            catalog,
            pricing: Arc::new(DeterministicPricingEngine),
            follow_up: None,
            audit: Arc::new(NoopAuditSink),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn with_pricing_engine(mut self, pricing: Arc<dyn PricingEngine>) -> Self {
        self.pricing = pricing;
        self
    }

    /// Runs after every successful `create`.
    pub fn with_follow_up(mut self, follow_up: Arc<dyn QuoteFollowUp>) -> Self {
        self.follow_up = Some(follow_up);
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn catalog(&self) -> &RateCatalog {
        &self.catalog
    }

    /// Validates, prices and stores a new quote, then runs the follow-up.
    /// A failed follow-up never fails the call; the stored quote is returned
    /// without CRM links.
    pub fn create(&self, draft: &QuoteDraft) -> Result<Quote, ApplicationError> {
        let request = draft.validate()?;
        let id = self.quotes.next_id()?;
        let priced = self.price(&request, Some(id))?;

        let now = Utc::now();
        let mut quote = Quote {
            id,
            customer_name: draft.customer_name.trim().to_owned(),
            customer_email: draft.customer_email.trim().to_owned(),
            customer_phone: draft.customer_phone.clone(),
            square_footage: request.square_footage,
            service_frequency: request.service_frequency,
            add_ons: request.add_ons,
            pricing: priced.quote,
            status: QuoteStatus::Pending,
            created_at: now,
            updated_at: now,
            prospect_id: None,
            proposal_id: None,
        };
        self.quotes.insert(quote.clone())?;

        info!(
            event_name = "quote.created",
            quote_id = %quote.id,
            total_price = %quote.pricing.total_price,
            "quote created"
        );
        self.audit.emit(
            AuditEvent::new(
                Some(quote.id),
                "quote.created",
                AuditCategory::Quote,
                ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("total_price", quote.pricing.total_price.to_string()),
        );

        let Some(follow_up) = &self.follow_up else {
            return Ok(quote);
        };
        if let FollowUpOutcome::Linked { prospect_id, proposal_id } = follow_up.after_commit(&quote)
        {
            // Only the link columns are written; the row may have changed
            // while the follow-up ran.
            let linked = self.quotes.modify(quote.id, &mut |row| {
                row.prospect_id = Some(prospect_id);
                row.proposal_id = Some(proposal_id);
            });
            match linked {
                Ok(Some(linked)) => quote = linked,
                Ok(None) => warn!(
                    event_name = "quote.link_lost",
                    quote_id = %quote.id,
                    "quote vanished before CRM links were stored"
                ),
                Err(error) => warn!(
                    event_name = "quote.link_lost",
                    quote_id = %quote.id,
                    error = %error,
                    "failed to store CRM links on quote"
                ),
            }
        }
        Ok(quote)
    }

    /// Merges the patch and reprices when square footage, frequency or
    /// add-ons change. Merge and repricing run against the stored row under
    /// its write lock; a failed patch or pricing leaves the row untouched.
    pub fn update(&self, id: QuoteId, patch: &QuotePatch) -> Result<Quote, ApplicationError> {
        let mut failure = None;
        let mut previous_total = None;
        let updated = self.quotes.modify(id, &mut |row| {
            let mut next = row.clone();
            if let Err(error) = patch.apply_to(&mut next) {
                failure = Some(ApplicationError::from(error));
                return;
            }
            if patch.touches_pricing() {
                match self.price(&next.request(), Some(id)) {
                    Ok(result) => {
                        previous_total = Some(row.pricing.total_price);
                        next.pricing = result.quote;
                    }
                    Err(error) => {
                        failure = Some(error);
                        return;
                    }
                }
            }
            next.id = id;
            next.updated_at = Utc::now();
            *row = next;
        })?;
        if let Some(error) = failure {
            return Err(error);
        }
        let quote = updated.ok_or_else(|| DomainError::not_found("Quote", id))?;

        if let Some(previous_total) = previous_total {
            info!(
                event_name = "quote.repriced",
                quote_id = %id,
                previous_total = %previous_total,
                total_price = %quote.pricing.total_price,
                "quote repriced after update"
            );
        }
        info!(event_name = "quote.updated", quote_id = %id, "quote updated");
        Ok(quote)
    }

    /// Hard delete; returns the removed quote.
    pub fn delete(&self, id: QuoteId) -> Result<Quote, ApplicationError> {
        let quote = self.quotes.remove(id)?.ok_or_else(|| DomainError::not_found("Quote", id))?;

        info!(event_name = "quote.deleted", quote_id = %id, "quote deleted");
        Ok(quote)
    }

    pub fn get_all(&self) -> Result<Vec<Quote>, ApplicationError> {
        Ok(self.quotes.all()?)
    }

    pub fn get_by_id(&self, id: QuoteId) -> Result<Quote, ApplicationError> {
        self.quotes.find(id)?.ok_or_else(|| DomainError::not_found("Quote", id).into())
    }

    pub fn get_by_status(&self, status: QuoteStatus) -> Result<Vec<Quote>, ApplicationError> {
        Ok(self.quotes.all()?.into_iter().filter(|quote| quote.status == status).collect())
    }

    /// Newest first; `None` uses the configured limit.
    pub fn get_recent(&self, limit: Option<usize>) -> Result<Vec<Quote>, ApplicationError> {
        let mut quotes = self.quotes.all()?;
        quotes.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then_with(|| right.id.cmp(&left.id))
        });
        quotes.truncate(limit.unwrap_or(self.recent_limit));
        Ok(quotes)
    }

    /// Prices a request against the live catalog without storing anything.
    pub fn preview(&self, request: &QuoteRequest) -> Result<PricingResult, ApplicationError> {
        let result = self.pricing.price(request, &self.catalog.snapshot()?);
        debug!(
            event_name = "quote.previewed",
            total_price = %result.quote.total_price,
            degradations = result.degradations.len(),
            "quote preview priced"
        );
        Ok(result)
    }

    fn price(
        &self,
        request: &QuoteRequest,
        quote_id: Option<QuoteId>,
    ) -> Result<PricingResult, ApplicationError> {
        let result = self.pricing.price(request, &self.catalog.snapshot()?);

        for degradation in &result.degradations {
            warn!(
                event_name = "pricing.degraded",
                quote_id = quote_id.map(|id| id.to_string()).as_deref(),
                code = degradation.code(),
                detail = %degradation,
                "pricing input fell back to a zero contribution"
            );
            self.audit.emit(
                AuditEvent::new(
                    quote_id,
                    "pricing.degraded",
                    AuditCategory::Pricing,
                    ACTOR,
                    AuditOutcome::Degraded,
                )
                .with_metadata("code", degradation.code())
                .with_metadata("detail", degradation.to_string()),
            );
        }

        Ok(result)
    }
}
