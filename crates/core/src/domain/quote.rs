use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::client::ClientId;
use crate::domain::proposal::ProposalId;
use crate::domain::rate::ServiceFrequency;
use crate::errors::DomainError;
use crate::store::Record;

record_id!(QuoteId, "Quote");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Declined,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(DomainError::InvalidArgument(format!(
                "unsupported quote status `{other}` (expected pending|accepted|declined)"
            ))),
        }
    }
}

/// The pricing-relevant inputs of a quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub square_footage: i64,
    #[serde(default)]
    pub service_frequency: Option<ServiceFrequency>,
    #[serde(default)]
    pub add_ons: Vec<String>,
}

impl QuoteRequest {
    /// Add-on keys in request order with repeats removed; a key selects a
    /// surcharge at most once.
    pub fn unique_add_ons(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.add_ons.len());
        for key in &self.add_ons {
            if !seen.contains(&key.as_str()) {
                seen.push(key.as_str());
            }
        }
        seen
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedQuote {
    pub base_price: Decimal,
    pub surcharges: Decimal,
    pub discounts: Decimal,
    pub total_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub square_footage: i64,
    pub service_frequency: Option<ServiceFrequency>,
    pub add_ons: Vec<String>,
    #[serde(flatten)]
    pub pricing: PricedQuote,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prospect_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_id: Option<ProposalId>,
}

impl Quote {
    pub fn request(&self) -> QuoteRequest {
        QuoteRequest {
            square_footage: self.square_footage,
            service_frequency: self.service_frequency,
            add_ons: self.add_ons.clone(),
        }
    }
}

impl Record for Quote {
    type Id = QuoteId;

    fn id(&self) -> QuoteId {
        self.id
    }
}

/// A quote submission as it arrives from the quote form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDraft {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub square_footage: Option<i64>,
    #[serde(default)]
    pub service_frequency: Option<ServiceFrequency>,
    #[serde(default)]
    pub add_ons: Vec<String>,
}

impl QuoteDraft {
    /// Checks the required fields and returns the pricing inputs.
    pub fn validate(&self) -> Result<QuoteRequest, DomainError> {
        let mut missing = Vec::new();
        if self.customer_name.trim().is_empty() {
            missing.push("customerName");
        }
        if self.customer_email.trim().is_empty() {
            missing.push("customerEmail");
        }
        let square_footage = self.square_footage.filter(|value| *value > 0);
        if square_footage.is_none() {
            missing.push("squareFootage");
        }

        match square_footage {
            Some(square_footage) if missing.is_empty() => Ok(QuoteRequest {
                square_footage,
                service_frequency: self.service_frequency,
                add_ons: self.add_ons.clone(),
            }),
            _ => Err(DomainError::Validation(format!(
                "Customer name, email, and square footage are required (missing: {})",
                missing.join(", ")
            ))),
        }
    }
}

/// Partial update for a stored quote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePatch {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub square_footage: Option<i64>,
    #[serde(default)]
    pub service_frequency: Option<ServiceFrequency>,
    #[serde(default)]
    pub add_ons: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<QuoteStatus>,
}

impl QuotePatch {
    pub fn touches_pricing(&self) -> bool {
        self.square_footage.is_some() || self.service_frequency.is_some() || self.add_ons.is_some()
    }

    /// Merges the patch onto `quote`. Priced fields are left to the caller.
    pub fn apply_to(&self, quote: &mut Quote) -> Result<(), DomainError> {
        if matches!(&self.customer_name, Some(name) if name.trim().is_empty()) {
            return Err(DomainError::Validation("customerName must not be empty".to_string()));
        }
        if matches!(&self.customer_email, Some(email) if email.trim().is_empty()) {
            return Err(DomainError::Validation("customerEmail must not be empty".to_string()));
        }
        if matches!(self.square_footage, Some(value) if value <= 0) {
            return Err(DomainError::Validation(
                "squareFootage must be greater than zero".to_string(),
            ));
        }

        if let Some(name) = &self.customer_name {
            quote.customer_name = name.clone();
        }
        if let Some(email) = &self.customer_email {
            quote.customer_email = email.clone();
        }
        if let Some(phone) = &self.customer_phone {
            quote.customer_phone = Some(phone.clone());
        }
        if let Some(square_footage) = self.square_footage {
            quote.square_footage = square_footage;
        }
        if let Some(frequency) = self.service_frequency {
            quote.service_frequency = Some(frequency);
        }
        if let Some(add_ons) = &self.add_ons {
            quote.add_ons = add_ons.clone();
        }
        if let Some(status) = self.status {
            quote.status = status;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{PricedQuote, Quote, QuoteDraft, QuoteId, QuotePatch, QuoteRequest, QuoteStatus};
    use crate::domain::rate::ServiceFrequency;
    use crate::errors::DomainError;

    fn quote() -> Quote {
        Quote {
            id: QuoteId(1),
            customer_name: "Dana Reyes".to_string(),
            customer_email: "dana@example.com".to_string(),
            customer_phone: None,
            square_footage: 500,
            service_frequency: Some(ServiceFrequency::Weekly),
            add_ons: vec![],
            pricing: PricedQuote::default(),
            status: QuoteStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            prospect_id: None,
            proposal_id: None,
        }
    }

    #[test]
    fn draft_lists_missing_required_fields() {
        let draft = QuoteDraft { customer_name: "Dana".to_string(), ..QuoteDraft::default() };

        let error = draft.validate().expect_err("email and square footage missing");
        assert_eq!(
            error,
            DomainError::Validation(
                "Customer name, email, and square footage are required (missing: customerEmail, squareFootage)"
                    .to_string()
            )
        );
    }

    #[test]
    fn draft_rejects_zero_square_footage() {
        let draft = QuoteDraft {
            customer_name: "Dana".to_string(),
            customer_email: "dana@example.com".to_string(),
            square_footage: Some(0),
            ..QuoteDraft::default()
        };

        assert!(matches!(draft.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn unique_add_ons_keeps_first_occurrence_order() {
        let request = QuoteRequest {
            square_footage: 1200,
            service_frequency: None,
            add_ons: vec!["pets".into(), "deepcleaning".into(), "pets".into()],
        };

        assert_eq!(request.unique_add_ons(), vec!["pets", "deepcleaning"]);
    }

    #[test]
    fn patch_reports_whether_pricing_inputs_change() {
        assert!(!QuotePatch { customer_name: Some("Ana".into()), ..QuotePatch::default() }
            .touches_pricing());
        assert!(QuotePatch { add_ons: Some(vec![]), ..QuotePatch::default() }.touches_pricing());
    }

    #[test]
    fn patch_merges_fields_and_keeps_identity() {
        let mut stored = quote();
        let patch = QuotePatch {
            square_footage: Some(2500),
            status: Some(QuoteStatus::Accepted),
            ..QuotePatch::default()
        };

        patch.apply_to(&mut stored).expect("patch applies");
        assert_eq!(stored.id, QuoteId(1));
        assert_eq!(stored.square_footage, 2500);
        assert_eq!(stored.status, QuoteStatus::Accepted);
        assert_eq!(stored.customer_name, "Dana Reyes");
    }

    #[test]
    fn quote_serializes_priced_fields_inline() {
        let value = serde_json::to_value(quote()).expect("serialize quote");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["serviceFrequency"], "weekly");
        assert!(value.get("totalPrice").is_some());
        assert!(value.get("prospectId").is_none());
    }
}
