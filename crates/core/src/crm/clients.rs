use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::crm::ClientCollaborator;
use crate::domain::client::{Client, ClientId, NewClient};
use crate::errors::{ApplicationError, DomainError};
use crate::store::Repository;

pub struct ClientBook {
    clients: Arc<dyn Repository<Client>>,
}

impl ClientBook {
    pub fn new(clients: Arc<dyn Repository<Client>>) -> Self {
        Self { clients }
    }

    pub fn get_all(&self) -> Result<Vec<Client>, ApplicationError> {
        Ok(self.clients.all()?)
    }

    pub fn get_by_id(&self, id: ClientId) -> Result<Client, ApplicationError> {
        self.clients.find(id)?.ok_or_else(|| DomainError::not_found("Client", id).into())
    }
}

impl ClientCollaborator for ClientBook {
    fn create(&self, client: NewClient) -> Result<Client, ApplicationError> {
        let name = client.name.trim();
        let email = client.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(DomainError::Validation("client name and email are required".to_owned())
                .into());
        }

        let record = Client {
            id: self.clients.next_id()?,
            name: name.to_owned(),
            email: email.to_owned(),
            phone: client.phone,
            status: client.status.unwrap_or_default(),
            source: client.source,
            notes: client.notes,
            created_at: Utc::now(),
        };
        self.clients.insert(record.clone())?;

        info!(
            event_name = "client.created",
            client_id = %record.id,
            status = ?record.status,
            "client created"
        );
        Ok(record)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Client>, ApplicationError> {
        let email = email.trim();
        Ok(self.clients.all()?.into_iter().find(|client| client.email.eq_ignore_ascii_case(email)))
    }
}
