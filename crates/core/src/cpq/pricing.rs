use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::RateSnapshot;
use crate::domain::quote::{PricedQuote, QuoteRequest};
use crate::domain::rate::{RateId, ServiceFrequency};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub steps: Vec<PricingTraceStep>,
}

impl PricingTrace {
    fn record(&mut self, stage: impl Into<String>, detail: impl Into<String>, amount: Decimal) {
        self.steps.push(PricingTraceStep { stage: stage.into(), detail: detail.into(), amount });
    }
}

/// A pricing input the catalog could not fully honour. Pricing still
/// completes; the affected contribution is zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingDegradation {
    NoMatchingTier { square_footage: i64 },
    UnmatchedAddOn { key: String },
    NoFrequencyDiscount { frequency: ServiceFrequency },
    DuplicateDiscount { frequency: ServiceFrequency, rate_ids: Vec<RateId> },
    AmountOverflow { stage: String, rate_id: RateId },
}

impl PricingDegradation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoMatchingTier { .. } => "no_matching_tier",
            Self::UnmatchedAddOn { .. } => "unmatched_add_on",
            Self::NoFrequencyDiscount { .. } => "no_frequency_discount",
            Self::DuplicateDiscount { .. } => "duplicate_discount",
            Self::AmountOverflow { .. } => "amount_overflow",
        }
    }
}

impl std::fmt::Display for PricingDegradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatchingTier { square_footage } => {
                write!(f, "no active tier covers {square_footage} sq ft; base price is 0")
            }
            Self::UnmatchedAddOn { key } => {
                write!(f, "add-on `{key}` matches no active surcharge; ignored")
            }
            Self::NoFrequencyDiscount { frequency } => {
                write!(f, "no active discount for `{frequency}` frequency")
            }
            Self::DuplicateDiscount { frequency, rate_ids } => {
                let ids = rate_ids.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(
                    f,
                    "{} active discounts for `{frequency}` (rates {}); the first applies",
                    rate_ids.len(),
                    ids.join(", ")
                )
            }
            Self::AmountOverflow { stage, rate_id } => {
                write!(f, "{stage} from rate {rate_id} is out of range; contributes 0")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub quote: PricedQuote,
    pub trace: PricingTrace,
    pub degradations: Vec<PricingDegradation>,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, request: &QuoteRequest, rates: &RateSnapshot) -> PricingResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, request: &QuoteRequest, rates: &RateSnapshot) -> PricingResult {
        calculate_quote(request, rates)
    }
}

/// Rounds to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Prices a request against a rate snapshot. Never fails: a missing tier,
/// surcharge or discount contributes zero and is reported as a degradation.
/// So does any contribution whose arithmetic would overflow `Decimal`.
pub fn calculate_quote(request: &QuoteRequest, rates: &RateSnapshot) -> PricingResult {
    let mut trace = PricingTrace::default();
    let mut degradations = Vec::new();

    let base_price = match rates.tier_for(request.square_footage) {
        Some(tier) => {
            trace.record(
                "base",
                format!("tier {} ({} sq ft)", tier.entry.id, request.square_footage),
                tier.base_price,
            );
            tier.base_price
        }
        None => {
            trace.record("base", "no matching tier", Decimal::ZERO);
            degradations
                .push(PricingDegradation::NoMatchingTier { square_footage: request.square_footage });
            Decimal::ZERO
        }
    };

    let mut surcharges = Decimal::ZERO;
    for key in request.unique_add_ons() {
        match rates.surcharge_for_key(key) {
            Some(surcharge) => {
                let stage = format!("surcharge:{key}");
                // The running sum must stay addable to the base.
                let next = surcharge
                    .kind
                    .apply(surcharge.value, base_price)
                    .and_then(|amount| Some((amount, surcharges.checked_add(amount)?)))
                    .filter(|(_, sum)| base_price.checked_add(*sum).is_some());
                match next {
                    Some((amount, sum)) => {
                        trace.record(stage, surcharge.entry.name.clone(), amount);
                        surcharges = sum;
                    }
                    None => {
                        trace.record(stage.clone(), "out of range", Decimal::ZERO);
                        degradations.push(PricingDegradation::AmountOverflow {
                            stage,
                            rate_id: surcharge.entry.id,
                        });
                    }
                }
            }
            None => {
                degradations.push(PricingDegradation::UnmatchedAddOn { key: key.to_string() });
            }
        }
    }

    let subtotal = base_price + surcharges;
    let mut discounts = Decimal::ZERO;
    if let Some(frequency) = request.service_frequency {
        let matches = rates.discounts_for(frequency);
        if matches.len() > 1 {
            degradations.push(PricingDegradation::DuplicateDiscount {
                frequency,
                rate_ids: matches.iter().map(|discount| discount.entry.id).collect(),
            });
        }
        match matches.first() {
            Some(discount) => {
                let amount = discount
                    .kind
                    .apply(discount.value, subtotal)
                    .filter(|amount| subtotal.checked_sub(*amount).is_some());
                match amount {
                    Some(amount) => {
                        discounts = amount;
                        trace.record(
                            "discount",
                            format!("{frequency} (rate {})", discount.entry.id),
                            discounts,
                        );
                    }
                    None => {
                        trace.record("discount", "out of range", Decimal::ZERO);
                        degradations.push(PricingDegradation::AmountOverflow {
                            stage: "discount".to_string(),
                            rate_id: discount.entry.id,
                        });
                    }
                }
            }
            None => degradations.push(PricingDegradation::NoFrequencyDiscount { frequency }),
        }
    }

    let total_price = (subtotal - discounts).max(Decimal::ZERO);
    trace.record("total", "max(0, base + surcharges - discounts)", total_price);

    PricingResult {
        quote: PricedQuote {
            base_price: round_money(base_price),
            surcharges: round_money(surcharges),
            discounts: round_money(discounts),
            total_price: round_money(total_price),
        },
        trace,
        degradations,
    }
}
