//! Markup (MKP) quote math and the guided dialogue that collects its inputs.

use std::fmt;

/// Royalty charged on the sale price, included in the total cost.
pub const ROYALTY_RATE: f64 = 0.10;
/// Markup at or above this is a good sale.
pub const IDEAL_MARKUP: f64 = 3.0;
/// Markup at or above this (but below ideal) is acceptable.
pub const MINIMUM_MARKUP: f64 = 2.5;

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkupQuote {
    pub cost: f64,
    pub logistics: f64,
    pub sale: f64,
    pub royalty: f64,
    pub total_cost: f64,
    pub markup: f64,
    pub ideal_sale: f64,
    pub minimum_sale: f64,
    pub band: MarkupBand,
}

impl MarkupQuote {
    /// Compute a quote. Returns `None` when the total cost is not positive,
    /// which would make the markup ratio undefined.
    pub fn compute(cost: f64, logistics: f64, sale: f64) -> Option<Self> {
        let royalty = sale * ROYALTY_RATE;
        let total_cost = cost + logistics + royalty;
        if total_cost <= 0.0 {
            return None;
        }

        let markup = sale / total_cost;
        Some(Self {
            cost,
            logistics,
            sale,
            royalty,
            total_cost,
            markup,
            ideal_sale: IDEAL_MARKUP * total_cost,
            minimum_sale: MINIMUM_MARKUP * total_cost,
            band: MarkupBand::classify(markup),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupBand {
    /// At or above the ideal markup.
    Good,
    /// Between the minimum and the ideal markup. The minimum itself
    /// belongs here, not in `Low`.
    Acceptable,
    /// Below the minimum markup.
    Low,
}

impl MarkupBand {
    pub fn classify(markup: f64) -> Self {
        if markup >= IDEAL_MARKUP {
            Self::Good
        } else if markup >= MINIMUM_MARKUP {
            Self::Acceptable
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for MarkupBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::Acceptable => write!(f, "acceptable"),
            Self::Low => write!(f, "low"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dialogue state machine
// ---------------------------------------------------------------------------

/// Where a conversation currently is in the MKP dialogue. Terminal states
/// are not represented: completion and cancellation drop the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialogueState {
    AwaitingCost,
    AwaitingLogistics { cost: f64 },
    AwaitingSaleValue { cost: f64, logistics: f64 },
}

/// Outcome of feeding one user input into the dialogue.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Input accepted, dialogue moved on. The caller prompts for the
    /// carried state's field.
    Next(DialogueState),
    /// All inputs collected, quote computed. Terminal.
    Quote(MarkupQuote),
    /// Input did not parse as a non-negative amount. State unchanged.
    NotANumber(DialogueState),
    /// Cost plus logistics came out zero, which would leave the markup
    /// ratio undefined for a zero sale. State unchanged.
    ZeroCost(DialogueState),
}

/// Advance the dialogue with one line of user input.
///
/// Amounts accept a decimal comma or dot. The logistics step rejects
/// `cost + logistics == 0`, so the final quote always has a positive
/// total cost.
pub fn advance(state: DialogueState, input: &str) -> Step {
    let amount = match parse_amount(input) {
        Some(v) => v,
        None => return Step::NotANumber(state),
    };

    match state {
        DialogueState::AwaitingCost => Step::Next(DialogueState::AwaitingLogistics { cost: amount }),
        DialogueState::AwaitingLogistics { cost } => {
            if cost + amount == 0.0 {
                return Step::ZeroCost(state);
            }
            Step::Next(DialogueState::AwaitingSaleValue {
                cost,
                logistics: amount,
            })
        }
        DialogueState::AwaitingSaleValue { cost, logistics } => {
            match MarkupQuote::compute(cost, logistics, amount) {
                Some(quote) => Step::Quote(quote),
                None => Step::ZeroCost(state),
            }
        }
    }
}

/// Parse a monetary amount: decimal comma or dot, finite, non-negative.
pub fn parse_amount(input: &str) -> Option<f64> {
    let value: f64 = input.trim().replace(',', ".").parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}
