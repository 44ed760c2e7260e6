pub mod audit;
pub mod config;
pub mod cpq;
pub mod crm;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod store;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use cpq::{
    calculate_quote, DeterministicPricingEngine, PricingDegradation, PricingEngine, PricingResult,
    RateCatalog, RateSnapshot, TierCoverage,
};
pub use crm::{
    BridgeStage, ClientBook, ClientCollaborator, FollowUpOutcome, ProposalBook,
    ProposalCollaborator, QuoteCrmBridge, QuoteFollowUp,
};
pub use domain::client::{Client, ClientId, ClientStatus, NewClient};
pub use domain::proposal::{LineItem, NewProposal, Proposal, ProposalId, ProposalStatus};
pub use domain::quote::{
    PricedQuote, Quote, QuoteDraft, QuoteId, QuotePatch, QuoteRequest, QuoteStatus,
};
pub use domain::rate::{
    AdjustmentKind, RateCategory, RateDraft, RateEntry, RateId, RatePatch, RateRule,
    ServiceFrequency, UNBOUNDED_SQ_FT,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use lifecycle::QuoteLifecycleManager;
pub use store::{Record, RecordId, Repository, StoreError};
