use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::client::ClientId;
use crate::domain::quote::QuoteId;
use crate::store::Record;

record_id!(ProposalId, "Proposal");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Declined,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: u32,
    pub service: String,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub client_id: ClientId,
    pub client_name: String,
    pub title: String,
    pub status: ProposalStatus,
    pub line_items: Vec<LineItem>,
    pub total: Decimal,
    #[serde(default)]
    pub notes: String,
    pub job_id: Option<u64>,
    pub date_sent: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_quote_id: Option<QuoteId>,
}

impl Record for Proposal {
    type Id = ProposalId;

    fn id(&self) -> ProposalId {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub client_id: ClientId,
    pub title: String,
    #[serde(default)]
    pub status: ProposalStatus,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source_quote_id: Option<QuoteId>,
}
