use serde::Serialize;
use tidyquote_core::cpq::{calculate_quote, round_money, PricingResult};
use tidyquote_core::domain::quote::QuoteRequest;
use tidyquote_core::domain::rate::ServiceFrequency;

use crate::commands::{to_json, CatalogContext, CommandResult, EXIT_INVALID_ARGUMENT};

const COMMAND: &str = "price";

#[derive(Debug, Clone, Default)]
pub struct PriceArgs {
    pub square_footage: i64,
    pub frequency: Option<String>,
    pub add_ons: Vec<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PriceReport<'a> {
    command: &'static str,
    currency: &'a str,
    request: &'a QuoteRequest,
    #[serde(flatten)]
    result: &'a PricingResult,
}

pub fn run(args: &PriceArgs) -> CommandResult {
    let request = match build_request(args) {
        Ok(request) => request,
        Err(message) => {
            return CommandResult::failure(
                COMMAND,
                "invalid_argument",
                message,
                EXIT_INVALID_ARGUMENT,
            )
        }
    };

    let context = match CatalogContext::load(COMMAND) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let snapshot = match context.snapshot(COMMAND) {
        Ok(snapshot) => snapshot,
        Err(failure) => return failure,
    };

    let result = calculate_quote(&request, &snapshot);
    let currency = context.config.pricing.currency.as_str();

    if args.json {
        return to_json(
            COMMAND,
            &PriceReport { command: COMMAND, currency, request: &request, result: &result },
        );
    }

    CommandResult::report(render_human(&request, &result, currency))
}

fn build_request(args: &PriceArgs) -> Result<QuoteRequest, String> {
    if args.square_footage <= 0 {
        return Err(format!("square footage must be greater than zero, got {}", args.square_footage));
    }
    let service_frequency = args
        .frequency
        .as_deref()
        .map(str::parse::<ServiceFrequency>)
        .transpose()
        .map_err(|error| error.to_string())?;

    Ok(QuoteRequest {
        square_footage: args.square_footage,
        service_frequency,
        add_ons: args.add_ons.clone(),
    })
}

fn render_human(request: &QuoteRequest, result: &PricingResult, currency: &str) -> String {
    let frequency =
        request.service_frequency.map(|frequency| frequency.label()).unwrap_or("no frequency");
    let mut lines =
        vec![format!("{} sq ft, {frequency}, prices in {currency}", request.square_footage)];

    for step in &result.trace.steps {
        lines.push(format!(
            "- {:<28} {:>10.2}  {}",
            step.stage,
            round_money(step.amount),
            step.detail
        ));
    }
    for degradation in &result.degradations {
        lines.push(format!("warning [{}]: {degradation}", degradation.code()));
    }

    let quote = &result.quote;
    lines.push(format!(
        "base {:.2} + surcharges {:.2} - discounts {:.2} = total {:.2} {currency}",
        quote.base_price, quote.surcharges, quote.discounts, quote.total_price
    ));
    lines.join("\n")
}
