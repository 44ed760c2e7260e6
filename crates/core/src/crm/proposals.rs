use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::crm::ProposalCollaborator;
use crate::domain::client::{Client, ClientId};
use crate::domain::proposal::{NewProposal, Proposal, ProposalId};
use crate::errors::{ApplicationError, DomainError};
use crate::store::Repository;

const UNKNOWN_CLIENT: &str = "Unknown Client";

pub struct ProposalBook {
    proposals: Arc<dyn Repository<Proposal>>,
    clients: Arc<dyn Repository<Client>>,
}

impl ProposalBook {
    pub fn new(
        proposals: Arc<dyn Repository<Proposal>>,
        clients: Arc<dyn Repository<Client>>,
    ) -> Self {
        Self { proposals, clients }
    }

    pub fn get_by_id(&self, id: ProposalId) -> Result<Proposal, ApplicationError> {
        self.proposals.find(id)?.ok_or_else(|| DomainError::not_found("Proposal", id).into())
    }

    pub fn list_for_client(&self, client_id: ClientId) -> Result<Vec<Proposal>, ApplicationError> {
        Ok(self
            .proposals
            .all()?
            .into_iter()
            .filter(|proposal| proposal.client_id == client_id)
            .collect())
    }
}

impl ProposalCollaborator for ProposalBook {
    fn create(&self, proposal: NewProposal) -> Result<Proposal, ApplicationError> {
        if proposal.title.trim().is_empty() {
            return Err(DomainError::Validation("proposal title is required".to_owned()).into());
        }

        let client_name = self
            .clients
            .find(proposal.client_id)?
            .map(|client| client.name)
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned());
        let total = proposal
            .line_items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.price))
            .ok_or_else(|| DomainError::Validation("proposal total is out of range".to_owned()))?;

        let record = Proposal {
            id: self.proposals.next_id()?,
            client_id: proposal.client_id,
            client_name,
            title: proposal.title,
            status: proposal.status,
            line_items: proposal.line_items,
            total,
            notes: proposal.notes,
            job_id: None,
            date_sent: Utc::now(),
            source_quote_id: proposal.source_quote_id,
        };
        self.proposals.insert(record.clone())?;

        info!(
            event_name = "proposal.created",
            proposal_id = %record.id,
            client_id = %record.client_id,
            total = %record.total,
            "proposal created"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::ProposalBook;
    use crate::cpq::catalog::tests::VecRepository;
    use crate::crm::ProposalCollaborator;
    use crate::domain::client::{Client, ClientId, ClientStatus};
    use crate::domain::proposal::{LineItem, NewProposal, ProposalStatus};
    use crate::errors::{ApplicationError, DomainError};

    fn book() -> ProposalBook {
        let client = Client {
            id: ClientId(3),
            name: "Dana Reyes".to_owned(),
            email: "dana@example.com".to_owned(),
            phone: String::new(),
            status: ClientStatus::Prospect,
            source: None,
            notes: None,
            created_at: Utc::now(),
        };
        ProposalBook::new(
            Arc::new(VecRepository::new(Vec::new())),
            Arc::new(VecRepository::new(vec![client])),
        )
    }

    fn draft(client_id: u64) -> NewProposal {
        NewProposal {
            client_id: ClientId(client_id),
            title: "Weekly Cleaning Proposal".to_owned(),
            status: ProposalStatus::Draft,
            line_items: vec![
                LineItem { id: 1, service: "Weekly Cleaning Service".to_owned(), price: Decimal::new(120, 0) },
                LineItem { id: 2, service: "Inside Windows".to_owned(), price: Decimal::new(1050, 2) },
            ],
            notes: String::new(),
            source_quote_id: None,
        }
    }

    #[test]
    fn create_totals_line_items_and_resolves_client_name() {
        let book = book();
        let proposal = book.create(draft(3)).expect("create");

        assert_eq!(proposal.total, Decimal::new(13050, 2));
        assert_eq!(proposal.client_name, "Dana Reyes");
        assert_eq!(proposal.job_id, None);
        assert_eq!(book.get_by_id(proposal.id).expect("stored"), proposal);
    }

    #[test]
    fn out_of_range_total_is_rejected() {
        let mut proposal = draft(3);
        proposal.line_items[0].price = Decimal::MAX;

        let error = book().create(proposal).expect_err("total overflows");
        assert!(matches!(error, ApplicationError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn unknown_client_gets_placeholder_name() {
        let proposal = book().create(draft(77)).expect("create");
        assert_eq!(proposal.client_name, "Unknown Client");
    }

    #[test]
    fn list_for_client_filters_by_client() {
        let book = book();
        book.create(draft(3)).expect("create");
        book.create(draft(4)).expect("create");

        let listed = book.list_for_client(ClientId(3)).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].client_id, ClientId(3));
    }
}
