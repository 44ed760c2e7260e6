use std::sync::Arc;

use tidyquote_core::audit::InMemoryAuditSink;
use tidyquote_core::config::PricingConfig;
use tidyquote_core::cpq::RateCatalog;
use tidyquote_core::crm::{ClientBook, ProposalBook, QuoteCrmBridge};
use tidyquote_core::lifecycle::QuoteLifecycleManager;
use tidyquote_db::MemoryStores;

/// Audit events kept for the lifetime of the process.
const AUDIT_CAPACITY: usize = 1_000;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RateCatalog>,
    pub quotes: Arc<QuoteLifecycleManager>,
    pub clients: Arc<ClientBook>,
    pub proposals: Arc<ProposalBook>,
    pub audit: InMemoryAuditSink,
    pub currency: String,
}

impl AppState {
    /// Wires the catalog, lifecycle manager and CRM bridge over one set of
    /// in-memory tables.
    pub fn new(stores: &MemoryStores, pricing: &PricingConfig) -> Self {
        let audit = InMemoryAuditSink::with_capacity(AUDIT_CAPACITY);
        let catalog = Arc::new(RateCatalog::new(stores.rates.clone()));
        let clients = Arc::new(ClientBook::new(stores.clients.clone()));
        let proposals =
            Arc::new(ProposalBook::new(stores.proposals.clone(), stores.clients.clone()));

        let bridge = QuoteCrmBridge::new(catalog.clone(), clients.clone(), proposals.clone())
            .with_audit_sink(Arc::new(audit.clone()));
        let quotes = QuoteLifecycleManager::new(stores.quotes.clone(), catalog.clone())
            .with_follow_up(Arc::new(bridge))
            .with_audit_sink(Arc::new(audit.clone()))
            .with_recent_limit(pricing.recent_quotes_limit);

        Self {
            catalog,
            quotes: Arc::new(quotes),
            clients,
            proposals,
            audit,
            currency: pricing.currency.clone(),
        }
    }
}
