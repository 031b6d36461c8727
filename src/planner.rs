// Itinerary generation: asks the model for up to a few trip options built
// only from the destination's catalog cities, then validates what comes back.

use crate::config::LlmConfig;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::{CountryCity, ItineraryOption, UserPreferences};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("No destination data found for country: {0}")]
    NoDestinationData(String),

    #[error("LLM call failed: {0}")]
    GenerationFailure(#[from] LlmError),

    #[error("LLM call timed out after {0}ms")]
    Timeout(u64),

    #[error("Malformed itinerary output: {0}")]
    MalformedGenerationOutput(String),
}

const SYSTEM_PROMPT: &str = "Reset context completely; ignore any previous conversation. \
You are a vacation itinerary planner. \
You may reason internally, but the final output MUST be ONLY valid JSON. \
Requirements: propose up to 3 itinerary options; use only the provided destination cities; \
if few cities, use one city as base; if many, you may use 2-3 cities; \
for each day create a detailed hourly schedule (e.g., '08:00', '10:30'); \
include concise notes in each slot so the user can imagine the experience; \
include an estimated_cost_idr per activity slot; \
when moving between cities, include realistic transport steps (e.g., depart Tokyo Station to Osaka Station, not teleport). \
Respect user budget and provide a budget breakdown; output must be a JSON array \
matching the required schema exactly. No extra commentary, explanations, or keys.";

const SCHEMA_EXAMPLE: &str = r#"[
  {
    "option_id": "string",
    "title": "string",
    "destination_country": "string",
    "cities": ["city1", "city2"],
    "total_days": 0,
    "estimated_total_budget_idr": 0,
    "budget_breakdown": {
      "flights": 0,
      "accommodation": 0,
      "activities": 0,
      "local_transport": 0
    },
    "daily_schedule": [
      {
        "day_number": 1,
        "city": "string",
        "date_offset_from_start": 0,
        "slots": [
          {
            "time": "08:00",
            "place": "string",
            "activity": "string",
            "notes": "string",
            "estimated_cost_idr": 0
          }
        ]
      }
    ]
  }
]"#;

// Known model slips, repaired once before giving up
const SANITIZE_REPLACEMENTS: [(&str, &str); 2] = [
    ("\"\"time\"", "\"time\""),
    ("\"date_offset_from\"", "\"date_offset_from_start\""),
];

/// Catalog entries for the destination, matched case-insensitively.
pub fn destination_cities(prefs: &UserPreferences, countries: &[CountryCity]) -> Vec<CountryCity> {
    let wanted = prefs.destination_country.trim();
    countries
        .iter()
        .filter(|entry| entry.country.trim().eq_ignore_ascii_case(wanted))
        .cloned()
        .collect()
}

pub fn build_user_prompt(prefs: &UserPreferences, cities: &[CountryCity]) -> String {
    let payload = json!({
        "user_prefs": prefs,
        "destination_cities_metadata": cities,
        "allow_multi_city": cities.len() >= 3,
    });
    let payload = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());

    format!(
        "Given the payload below, return ONLY a JSON array of itineraries that fits the schema.\n\n\
         Payload:\n{}\n\n\
         Required output schema example (match keys and structure):\n{}\n\n\
         Return ONLY this JSON array, nothing else.",
        payload, SCHEMA_EXAMPLE
    )
}

fn strip_think_blocks(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<think>") {
        output.push_str(&rest[..start]);
        // An unclosed block is kept as-is
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = &rest[start..];
                break;
            }
        }
    }
    output.push_str(rest);
    output.trim().to_string()
}

/// Pulls the itinerary list out of raw model text: drops `<think>` blocks,
/// takes the outermost `[...]`, repairs known slips once, and checks every
/// entry against the itinerary schema. At most `max_itineraries` are kept.
pub fn parse_itineraries(
    raw_output: &str,
    max_itineraries: usize,
) -> Result<Vec<ItineraryOption>, PlannerError> {
    let text = strip_think_blocks(raw_output);
    let (start, end) = match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(PlannerError::MalformedGenerationOutput(format!(
                "could not locate a JSON array in: {}",
                raw_output
            )))
        }
    };
    let json_str = &text[start..=end];

    let parsed: Value = match serde_json::from_str(json_str) {
        Ok(value) => value,
        Err(_) => {
            let sanitized = SANITIZE_REPLACEMENTS
                .iter()
                .fold(json_str.to_string(), |acc, (from, to)| acc.replace(from, to));
            serde_json::from_str(&sanitized).map_err(|err| {
                PlannerError::MalformedGenerationOutput(format!(
                    "failed to parse itineraries JSON: {}; raw: {}",
                    err, json_str
                ))
            })?
        }
    };

    let Value::Array(entries) = parsed else {
        return Err(PlannerError::MalformedGenerationOutput(
            "parsed itineraries payload is not a list".to_string(),
        ));
    };

    if entries.len() > max_itineraries {
        warn!(
            returned = entries.len(),
            kept = max_itineraries,
            "Model returned more itineraries than requested"
        );
    }

    entries
        .into_iter()
        .take(max_itineraries)
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<ItineraryOption>(entry).map_err(|err| {
                PlannerError::MalformedGenerationOutput(format!("itinerary {}: {}", index, err))
            })
        })
        .collect()
}

pub struct ItineraryPlanner<C: LlmClient> {
    client: C,
    config: LlmConfig,
}

impl<C: LlmClient> ItineraryPlanner<C> {
    pub fn new(client: C, config: LlmConfig) -> Self {
        Self { client, config }
    }

    /// Generates up to `max_itineraries` options for the destination in
    /// `prefs`. Fails before calling the model when the catalog has no cities
    /// for that country. The call is bounded by `timeout_ms` and never retried.
    pub async fn generate_itineraries(
        &self,
        prefs: &UserPreferences,
        countries: &[CountryCity],
    ) -> Result<Vec<ItineraryOption>, PlannerError> {
        let cities = destination_cities(prefs, countries);
        if cities.is_empty() {
            return Err(PlannerError::NoDestinationData(
                prefs.destination_country.clone(),
            ));
        }

        let user_prompt = build_user_prompt(prefs, &cities);
        let started = Instant::now();
        let raw_output = tokio::time::timeout(
            Duration::from_millis(self.config.timeout_ms),
            self.client.chat(SYSTEM_PROMPT, &user_prompt),
        )
        .await
        .map_err(|_| PlannerError::Timeout(self.config.timeout_ms))??;

        let itineraries = parse_itineraries(&raw_output, self.config.max_itineraries)?;
        info!(
            destination = %prefs.destination_country,
            options = itineraries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated itineraries"
        );
        Ok(itineraries)
    }
}
