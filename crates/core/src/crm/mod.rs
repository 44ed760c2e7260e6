//! CRM collaborators the quote workflow writes into.
//!
//! The bridge only depends on the two traits below; [`ClientBook`] and
//! [`ProposalBook`] are the repository-backed implementations wired by the
//! server and the CLI.

pub mod bridge;
pub mod clients;
pub mod proposals;

use crate::domain::client::{Client, ClientStatus, NewClient};
use crate::domain::proposal::{NewProposal, Proposal};
use crate::errors::ApplicationError;

pub use bridge::{BridgeStage, FollowUpOutcome, QuoteCrmBridge, QuoteFollowUp};
pub use clients::ClientBook;
pub use proposals::ProposalBook;

pub trait ClientCollaborator: Send + Sync {
    fn create(&self, client: NewClient) -> Result<Client, ApplicationError>;

    /// Same as [`ClientCollaborator::create`] with the status forced to
    /// `prospect`.
    fn create_prospect(&self, client: NewClient) -> Result<Client, ApplicationError> {
        self.create(NewClient { status: Some(ClientStatus::Prospect), ..client })
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Client>, ApplicationError>;
}

pub trait ProposalCollaborator: Send + Sync {
    /// Persists a proposal. The collaborator computes `total` from the line
    /// items itself.
    fn create(&self, proposal: NewProposal) -> Result<Proposal, ApplicationError>;
}
