use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::domain::rate::{
    add_on_key, DiscountRate, RateCategory, RateDraft, RateEntry, RateId, RatePatch,
    ServiceFrequency, SurchargeRate, TierRate, UNBOUNDED_SQ_FT,
};
use crate::errors::{ApplicationError, DomainError};
use crate::store::Repository;

/// Active rates at one point in time, in catalog order. Pricing only ever
/// reads from a snapshot, so a quote is priced against one consistent view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateSnapshot {
    entries: Vec<RateEntry>,
}

impl RateSnapshot {
    pub fn new(entries: impl IntoIterator<Item = RateEntry>) -> Self {
        Self { entries: entries.into_iter().filter(|entry| entry.is_active).collect() }
    }

    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    /// Square footage tiers sorted ascending by `minSqFt`; ties keep catalog order.
    pub fn tiers(&self) -> Vec<TierRate<'_>> {
        let mut tiers = self.entries.iter().filter_map(RateEntry::as_tier).collect::<Vec<_>>();
        tiers.sort_by_key(|tier| tier.min_sq_ft);
        tiers
    }

    pub fn tier_for(&self, square_footage: i64) -> Option<TierRate<'_>> {
        self.tiers().into_iter().find(|tier| tier.contains(square_footage))
    }

    pub fn base_price(&self, square_footage: i64) -> Decimal {
        self.tier_for(square_footage).map(|tier| tier.base_price).unwrap_or(Decimal::ZERO)
    }

    pub fn surcharges(&self) -> impl Iterator<Item = SurchargeRate<'_>> {
        self.entries.iter().filter_map(RateEntry::as_surcharge)
    }

    pub fn surcharge_for_key(&self, key: &str) -> Option<SurchargeRate<'_>> {
        self.surcharges().find(|surcharge| add_on_key(&surcharge.entry.name) == key)
    }

    pub fn discounts(&self) -> impl Iterator<Item = DiscountRate<'_>> {
        self.entries.iter().filter_map(RateEntry::as_discount)
    }

    /// Every active discount for `frequency`, catalog order. Pricing applies
    /// the first one.
    pub fn discounts_for(&self, frequency: ServiceFrequency) -> Vec<DiscountRate<'_>> {
        self.discounts().filter(|discount| discount.frequency == frequency).collect()
    }

    pub fn tier_coverage(&self) -> TierCoverage {
        let tiers = self.tiers();
        let mut overlaps = Vec::new();
        let mut gaps = Vec::new();
        let mut widest: Option<TierRate<'_>> = None;
        // Quotes require at least one square foot.
        let mut covered_until = 0_i64;

        for tier in &tiers {
            let next_uncovered = covered_until.saturating_add(1);
            if tier.min_sq_ft > next_uncovered {
                gaps.push(SqFtRange { from: next_uncovered, to: tier.min_sq_ft - 1 });
            }
            if let Some(previous) = widest {
                if tier.min_sq_ft <= previous.max_sq_ft {
                    overlaps.push(TierOverlap { first: previous.entry.id, second: tier.entry.id });
                }
            }
            if widest.map_or(true, |previous| tier.max_sq_ft > previous.max_sq_ft) {
                widest = Some(*tier);
            }
            covered_until = covered_until.max(tier.max_sq_ft);
        }

        TierCoverage {
            tier_count: tiers.len(),
            overlaps,
            gaps,
            open_ended: covered_until == UNBOUNDED_SQ_FT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SqFtRange {
    pub from: i64,
    pub to: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TierOverlap {
    pub first: RateId,
    pub second: RateId,
}

/// How well the active tiers cover positive square footage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierCoverage {
    pub tier_count: usize,
    pub overlaps: Vec<TierOverlap>,
    pub gaps: Vec<SqFtRange>,
    pub open_ended: bool,
}

impl TierCoverage {
    pub fn is_complete(&self) -> bool {
        self.tier_count > 0 && self.overlaps.is_empty() && self.gaps.is_empty() && self.open_ended
    }

    pub fn describe(&self) -> String {
        if self.tier_count == 0 {
            return "no active square footage tiers".to_string();
        }

        let mut problems = Vec::new();
        for gap in &self.gaps {
            problems.push(format!("gap {}..={} sq ft", gap.from, gap.to));
        }
        for overlap in &self.overlaps {
            problems.push(format!("tiers {} and {} overlap", overlap.first, overlap.second));
        }
        if !self.open_ended {
            problems.push("largest tier has an upper bound".to_string());
        }

        if problems.is_empty() {
            format!("{} tiers cover all square footage", self.tier_count)
        } else {
            problems.join("; ")
        }
    }
}

pub struct RateCatalog {
    rates: Arc<dyn Repository<RateEntry>>,
}

impl RateCatalog {
    pub fn new(rates: Arc<dyn Repository<RateEntry>>) -> Self {
        Self { rates }
    }

    /// Every rate, active or not.
    pub fn get_all(&self) -> Result<Vec<RateEntry>, ApplicationError> {
        Ok(self.rates.all()?)
    }

    pub fn get_by_category(
        &self,
        category: RateCategory,
    ) -> Result<Vec<RateEntry>, ApplicationError> {
        Ok(self
            .snapshot()?
            .entries
            .into_iter()
            .filter(|entry| entry.category() == category)
            .collect())
    }

    pub fn get_square_footage_tiers(&self) -> Result<Vec<RateEntry>, ApplicationError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.tiers().into_iter().map(|tier| tier.entry.clone()).collect())
    }

    pub fn get_surcharges(&self) -> Result<Vec<RateEntry>, ApplicationError> {
        self.get_by_category(RateCategory::Surcharge)
    }

    pub fn get_discounts(&self) -> Result<Vec<RateEntry>, ApplicationError> {
        self.get_by_category(RateCategory::Discount)
    }

    pub fn get_by_id(&self, id: RateId) -> Result<RateEntry, ApplicationError> {
        self.rates.find(id)?.ok_or_else(|| DomainError::not_found("Rate", id).into())
    }

    /// New rates are always active, whatever the draft says.
    pub fn create(&self, draft: &RateDraft) -> Result<RateEntry, ApplicationError> {
        let rule = draft.into_rule()?;
        let now = Utc::now();
        let entry = RateEntry {
            id: self.rates.next_id()?,
            name: draft.name.trim().to_string(),
            description: draft.description.clone(),
            is_active: true,
            rule,
            created_at: now,
            updated_at: now,
        };
        self.rates.insert(entry.clone())?;

        info!(
            event_name = "rate.created",
            rate_id = %entry.id,
            category = %entry.category(),
            "rate created"
        );
        Ok(entry)
    }

    /// The patch is validated against the stored row under its write lock;
    /// a rejected patch leaves the row untouched.
    pub fn update(&self, id: RateId, patch: &RatePatch) -> Result<RateEntry, ApplicationError> {
        let mut rejected = None;
        let updated = self.rates.modify(id, &mut |row| {
            let mut next = row.clone();
            match patch.apply_to(&mut next) {
                Ok(()) => {
                    next.id = id;
                    next.updated_at = Utc::now();
                    *row = next;
                }
                Err(error) => rejected = Some(error),
            }
        })?;
        if let Some(error) = rejected {
            return Err(error.into());
        }
        let entry = updated.ok_or_else(|| DomainError::not_found("Rate", id))?;

        info!(event_name = "rate.updated", rate_id = %id, "rate updated");
        Ok(entry)
    }

    /// Soft delete: the rate stays in `get_all` with `isActive=false`.
    pub fn delete(&self, id: RateId) -> Result<RateEntry, ApplicationError> {
        let entry = self
            .rates
            .modify(id, &mut |row| {
                row.is_active = false;
                row.updated_at = Utc::now();
            })?
            .ok_or_else(|| DomainError::not_found("Rate", id))?;

        info!(event_name = "rate.soft_deleted", rate_id = %id, "rate deactivated");
        Ok(entry)
    }

    /// Base price of the first active tier containing `square_footage`, or
    /// zero when no tier matches.
    pub fn calculate_base_price(&self, square_footage: i64) -> Result<Decimal, ApplicationError> {
        Ok(self.snapshot()?.base_price(square_footage))
    }

    pub fn snapshot(&self) -> Result<RateSnapshot, ApplicationError> {
        Ok(RateSnapshot::new(self.rates.all()?))
    }

    pub fn tier_coverage(&self) -> Result<TierCoverage, ApplicationError> {
        Ok(self.snapshot()?.tier_coverage())
    }
}
