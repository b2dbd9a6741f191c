//! Message routing: commands, free-text lookup, and the per-conversation
//! MKP dialogue sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use precobot_core::mkp::{advance, DialogueState, MarkupBand, MarkupQuote, Step};
use precobot_store::{CatalogStore, MutationReport};

use crate::protocol::{InboundMessage, OutboundReply};

const DEFAULT_GREETING: &str = "\
Internal price assistant.\n\
\n\
Type a service or model to look up prices:\n\
  iPhone 14 Pro Max      -> every part and service for that model\n\
  Bateria iPhone 14      -> every matching battery\n\
  Vidro traseiro iPhone  -> every matching back glass\n\
\n\
Commands:\n\
  add <lines>   append catalog entries (one product per line)\n\
  edit <lines>  replace a model's options\n\
  mkp           guided markup calculation\n\
  cancel        abort the current calculation";

const PROMPT_COST: &str = "Send the part cost:";
const PROMPT_LOGISTICS: &str =
    "Now send the total logistics cost (round trip plus delivery to the technician):";
const PROMPT_SALE: &str = "Send the final sale price:";
const REPLY_INVALID_AMOUNT: &str = "Invalid amount. Send numbers only (e.g. 300.50).";
const REPLY_ZERO_COST: &str =
    "Part cost plus logistics must be above zero. Send the value again:";
const REPLY_CANCELLED: &str = "Calculation cancelled.";
const REPLY_NOTHING_TO_CANCEL: &str = "No calculation in progress.";
const REPLY_NOT_FOUND: &str =
    "Model not found. Check the spelling or try a keyword like in the start examples.";

/// Dispatches transport messages against the catalog store and keeps one
/// dialogue session per conversation.
pub struct Router {
    store: Arc<CatalogStore>,
    sessions: Mutex<HashMap<String, DialogueState>>,
    greeting: Option<String>,
}

impl Router {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
            greeting: None,
        }
    }

    /// Replace the built-in welcome text (config override).
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }

    pub fn handle(&self, msg: &InboundMessage) -> OutboundReply {
        let text = match msg.command.as_deref() {
            Some("start") => self.handle_start(),
            Some("add") => self.handle_add(&msg.text),
            Some("edit") => self.handle_edit(&msg.text),
            Some("mkp") => self.handle_mkp_start(&msg.conversation),
            Some("cancel") => self.handle_cancel(&msg.conversation),
            Some(other) => format!("Unknown command: {other}. Send `start` for usage."),
            None => self.handle_message(&msg.conversation, &msg.text),
        };
        OutboundReply::new(&msg.conversation, text)
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    fn handle_start(&self) -> String {
        self.greeting
            .clone()
            .unwrap_or_else(|| DEFAULT_GREETING.to_string())
    }

    fn handle_lookup(&self, query: &str) -> String {
        let results = self.store.lookup(query);
        if results.is_empty() {
            return REPLY_NOT_FOUND.to_string();
        }

        let mut reply = String::from("Prices found:\n");
        for (name, price) in &results {
            reply.push_str(&format!(
                "- {}: {}\n",
                title_case(name),
                format_amount(*price)
            ));
        }
        reply
    }

    fn handle_add(&self, text: &str) -> String {
        match self.store.add(text) {
            Ok(report) if report.applied.is_empty() => {
                "Nothing added: no line had a price.".to_string()
            }
            Ok(report) => format!("Added: {}", report.applied.join(", ")),
            Err(e) => {
                warn!("add failed: {e}");
                format!("failed to save catalog: {e}")
            }
        }
    }

    fn handle_edit(&self, text: &str) -> String {
        match self.store.edit(text) {
            Ok(report) => format_edit_report(&report),
            Err(e) => {
                warn!("edit failed: {e}");
                format!("failed to save catalog: {e}")
            }
        }
    }

    fn handle_mkp_start(&self, conversation: &str) -> String {
        self.lock_sessions()
            .insert(conversation.to_string(), DialogueState::AwaitingCost);
        PROMPT_COST.to_string()
    }

    fn handle_cancel(&self, conversation: &str) -> String {
        match self.lock_sessions().remove(conversation) {
            Some(_) => REPLY_CANCELLED.to_string(),
            None => REPLY_NOTHING_TO_CANCEL.to_string(),
        }
    }

    /// Plain text: a dialogue step when a session is active, otherwise a
    /// price lookup.
    fn handle_message(&self, conversation: &str, text: &str) -> String {
        let mut sessions = self.lock_sessions();
        let state = match sessions.get(conversation) {
            Some(state) => *state,
            None => {
                drop(sessions);
                return self.handle_lookup(text);
            }
        };

        match advance(state, text) {
            Step::Next(next) => {
                sessions.insert(conversation.to_string(), next);
                prompt_for(&next).to_string()
            }
            Step::Quote(quote) => {
                sessions.remove(conversation);
                format_quote(&quote)
            }
            Step::NotANumber(_) => REPLY_INVALID_AMOUNT.to_string(),
            Step::ZeroCost(_) => REPLY_ZERO_COST.to_string(),
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, DialogueState>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Reply formatting
// ---------------------------------------------------------------------------

fn prompt_for(state: &DialogueState) -> &'static str {
    match state {
        DialogueState::AwaitingCost => PROMPT_COST,
        DialogueState::AwaitingLogistics { .. } => PROMPT_LOGISTICS,
        DialogueState::AwaitingSaleValue { .. } => PROMPT_SALE,
    }
}

fn format_quote(quote: &MarkupQuote) -> String {
    let mut reply = format!(
        "Markup check\n\
         Cost: {}\n\
         Logistics: {}\n\
         Royalty (10%): {}\n\
         Total cost: {}\n\
         Sale: {}\n\
         Markup: {:.2}\n\n",
        format_amount(quote.cost),
        format_amount(quote.logistics),
        format_amount(quote.royalty),
        format_amount(quote.total_cost),
        format_amount(quote.sale),
        quote.markup,
    );

    match quote.band {
        MarkupBand::Good => {
            reply.push_str("Good sale, markup at or above 3.0. Confirm before closing.");
        }
        MarkupBand::Acceptable => {
            reply.push_str(&format!(
                "Acceptable margin, close to target.\n\
                 For the ideal markup (3.0) the sale should be {}.\n\
                 Confirm before closing.",
                format_amount(quote.ideal_sale)
            ));
        }
        MarkupBand::Low => {
            reply.push_str(&format!(
                "Low margin, markup under 2.5.\n\
                 Ideal sale for markup 3.0: {}\n\
                 Minimum sale for markup 2.5: {}\n\
                 Confirm before closing.",
                format_amount(quote.ideal_sale),
                format_amount(quote.minimum_sale)
            ));
        }
    }

    reply
}

fn format_edit_report(report: &MutationReport) -> String {
    let unmatched = report.unmatched_models();

    if report.applied.is_empty() && unmatched.is_empty() {
        return "Nothing edited: no line had a price.".to_string();
    }

    let mut reply = String::new();
    if !report.applied.is_empty() {
        reply.push_str(&format!("Updated: {}", report.applied.join(", ")));
    }
    if !unmatched.is_empty() {
        if !reply.is_empty() {
            reply.push('\n');
        }
        reply.push_str(&format!("No record matched: {}", unmatched.join(", ")));
    }
    reply
}

fn format_amount(value: f64) -> String {
    format!("R$ {value:.2}")
}

/// Uppercase the first letter of each word. Index keys are stored
/// case-folded; replies show them the way a label reads.
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
