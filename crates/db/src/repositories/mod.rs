use std::sync::Arc;

use tidyquote_core::domain::client::Client;
use tidyquote_core::domain::proposal::Proposal;
use tidyquote_core::domain::quote::Quote;
use tidyquote_core::domain::rate::RateEntry;

pub mod memory;

pub use memory::InMemoryRepository;

pub type RateRepository = InMemoryRepository<RateEntry>;
pub type QuoteRepository = InMemoryRepository<Quote>;
pub type ClientRepository = InMemoryRepository<Client>;
pub type ProposalRepository = InMemoryRepository<Proposal>;

/// One table per record type, shared by every service that needs it.
#[derive(Clone)]
pub struct MemoryStores {
    pub rates: Arc<RateRepository>,
    pub quotes: Arc<QuoteRepository>,
    pub clients: Arc<ClientRepository>,
    pub proposals: Arc<ProposalRepository>,
}

impl MemoryStores {
    pub fn empty() -> Self {
        Self::with_rates(Vec::new())
    }

    pub fn with_rates(rates: Vec<RateEntry>) -> Self {
        Self {
            rates: Arc::new(InMemoryRepository::with_rows("rates", rates)),
            quotes: Arc::new(InMemoryRepository::new("quotes")),
            clients: Arc::new(InMemoryRepository::new("clients")),
            proposals: Arc::new(InMemoryRepository::new("proposals")),
        }
    }
}

impl Default for MemoryStores {
    fn default() -> Self {
        Self::empty()
    }
}
