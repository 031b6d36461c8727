// Itinerary resolver: binds an abstract itinerary to concrete flights and
// hotels, prices it, and optionally commits the booking.
//
// Selection is deterministic for a given inventory snapshot. Wherever two
// candidates cost the same, the one met first in candidate order wins.

use crate::allocator::{allocate_nights, NightAllocation};
use crate::catalog::Catalog;
use crate::config::BookingPolicy;
use crate::ledger::{BookingDraft, BookingLedger, LedgerError};
use crate::models::{
    BookingRecord, FlightRecord, HotelRecord, HotelStay, ItineraryOption, StaySummary, TravelStyle,
    UserPreferences,
};
use crate::payment::PaymentInfo;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid user preferences: {0}")]
    InvalidPreferences(String),

    #[error("Chosen itinerary has no cities to visit")]
    EmptyItinerary,

    #[error("No available flights for {origin} -> {first_city} / {last_city} -> {origin}")]
    NoFlightsAvailable {
        origin: String,
        first_city: String,
        last_city: String,
    },

    #[error("No hotels available in {city} for style {style}")]
    NoHotelsAvailable { city: String, style: TravelStyle },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Parses preferences coming from an untyped source (form state, JSON
/// request), reporting missing or mistyped fields as `InvalidPreferences`.
pub fn preferences_from_json(value: serde_json::Value) -> Result<UserPreferences, ResolveError> {
    serde_json::from_value(value).map_err(|err| ResolveError::InvalidPreferences(err.to_string()))
}

pub fn validate_preferences(
    prefs: &UserPreferences,
    policy: &BookingPolicy,
    today: NaiveDate,
) -> Result<(), ResolveError> {
    if prefs.origin_city.trim().is_empty() {
        return Err(ResolveError::InvalidPreferences(
            "origin_city is required".to_string(),
        ));
    }
    if prefs.trip_length_days < policy.min_trip_days
        || prefs.trip_length_days > policy.max_trip_days
    {
        return Err(ResolveError::InvalidPreferences(format!(
            "trip_length_days must be between {} and {}, got {}",
            policy.min_trip_days, policy.max_trip_days, prefs.trip_length_days
        )));
    }
    if prefs.budget_idr == 0 {
        return Err(ResolveError::InvalidPreferences(
            "budget_idr must be positive".to_string(),
        ));
    }
    if prefs.start_date < today {
        warn!(
            start_date = %prefs.start_date,
            %today,
            "Resolving a trip whose start date has already passed"
        );
    }
    Ok(())
}

fn cheapest_flight(options: &[FlightRecord]) -> Option<&FlightRecord> {
    options.iter().min_by_key(|flight| flight.base_price)
}

fn cheapest_hotel(options: &[HotelRecord]) -> Option<&HotelRecord> {
    options.iter().min_by_key(|hotel| hotel.price_per_night)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub outbound_flight: u64,
    pub return_flight: u64,
    pub total_flights: u64,
    pub accommodation: u64,
    pub buffer_activities_transport: u64,
    pub grand_total: u64,
}

impl CostBreakdown {
    pub fn compute(
        outbound: &FlightRecord,
        return_flight: &FlightRecord,
        stays: &[HotelStay],
        policy: &BookingPolicy,
    ) -> Self {
        let total_flights = outbound.base_price.saturating_add(return_flight.base_price);
        let accommodation = stays
            .iter()
            .fold(0u64, |sum, stay| sum.saturating_add(stay.cost()));
        let base_cost = total_flights.saturating_add(accommodation);
        let buffer = policy.buffer_for(base_cost);

        Self {
            outbound_flight: outbound.base_price,
            return_flight: return_flight.base_price,
            total_flights,
            accommodation,
            buffer_activities_transport: buffer,
            grand_total: base_cost.saturating_add(buffer),
        }
    }
}

// An itinerary bound to inventory and priced, not yet committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBooking {
    pub country: String,
    pub cities: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub outbound: FlightRecord,
    pub return_flight: FlightRecord,
    pub stays: Vec<HotelStay>,
    pub cost_breakdown: CostBreakdown,
    pub total_price_idr: u64,
    pub budget_warning: bool,
}

impl ResolvedBooking {
    pub fn proposed_flights(&self) -> Vec<FlightRecord> {
        vec![self.outbound.clone(), self.return_flight.clone()]
    }

    pub fn stay_plan(&self) -> Vec<StaySummary> {
        self.stays.iter().map(HotelStay::summary).collect()
    }

    pub fn to_draft(&self) -> BookingDraft {
        BookingDraft {
            country: self.country.clone(),
            cities: self.cities.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            flights: self.proposed_flights(),
            stays: self.stays.clone(),
            total_price_idr: self.total_price_idr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BookingOutcome {
    Booked {
        resolved: ResolvedBooking,
        booking_record: BookingRecord,
    },
    SimulationOnly {
        resolved: ResolvedBooking,
    },
}

impl BookingOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            BookingOutcome::Booked { .. } => "booked",
            BookingOutcome::SimulationOnly { .. } => "simulation_only",
        }
    }

    pub fn resolved(&self) -> &ResolvedBooking {
        match self {
            BookingOutcome::Booked { resolved, .. } => resolved,
            BookingOutcome::SimulationOnly { resolved } => resolved,
        }
    }

    pub fn booking_record(&self) -> Option<&BookingRecord> {
        match self {
            BookingOutcome::Booked { booking_record, .. } => Some(booking_record),
            BookingOutcome::SimulationOnly { .. } => None,
        }
    }
}

pub struct ItineraryResolver {
    catalog: Catalog,
    ledger: BookingLedger,
    policy: BookingPolicy,
}

impl ItineraryResolver {
    pub fn new(catalog: Catalog, ledger: BookingLedger, policy: BookingPolicy) -> Self {
        let catalog = catalog.with_fallback_candidates(policy.fallback_flight_candidates);
        Self {
            catalog,
            ledger,
            policy,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    /// Selects flights and hotels for the itinerary and prices the trip
    /// without touching the ledger or inventory.
    pub fn quote(
        &self,
        itinerary: &ItineraryOption,
        prefs: &UserPreferences,
        today: NaiveDate,
    ) -> Result<ResolvedBooking, ResolveError> {
        validate_preferences(prefs, &self.policy, today)?;
        let start_date = prefs.start_date;
        let end_date = prefs.end_date();

        let (first_city, last_city) = match (itinerary.cities.first(), itinerary.cities.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ResolveError::EmptyItinerary),
        };

        let options = self.catalog.find_flights_for_trip(
            &prefs.origin_city,
            first_city,
            last_city,
            start_date,
            end_date,
        );
        let (outbound, return_flight) = match (
            cheapest_flight(&options.outbound),
            cheapest_flight(&options.return_options),
        ) {
            (Some(outbound), Some(return_flight)) => (outbound.clone(), return_flight.clone()),
            _ => {
                return Err(ResolveError::NoFlightsAvailable {
                    origin: prefs.origin_city.clone(),
                    first_city: first_city.clone(),
                    last_city: last_city.clone(),
                })
            }
        };

        let allocation = allocate_nights(&itinerary.cities, prefs.trip_length_days);
        let stays = self.book_stays(
            &allocation,
            &itinerary.destination_country,
            prefs.travel_style,
            start_date,
        )?;

        let cost_breakdown =
            CostBreakdown::compute(&outbound, &return_flight, &stays, &self.policy);
        let total_price_idr = cost_breakdown.grand_total;
        let budget_warning = total_price_idr > self.policy.budget_ceiling(prefs.budget_idr);
        if budget_warning {
            warn!(
                total_price_idr,
                budget_idr = prefs.budget_idr,
                "Trip price exceeds the budget tolerance"
            );
        }

        Ok(ResolvedBooking {
            country: itinerary.destination_country.clone(),
            cities: itinerary.cities.clone(),
            start_date,
            end_date,
            outbound,
            return_flight,
            stays,
            cost_breakdown,
            total_price_idr,
            budget_warning,
        })
    }

    /// Quotes the itinerary and, when a payment method that allows
    /// auto-booking is supplied, commits it through the ledger.
    pub fn resolve(
        &self,
        itinerary: &ItineraryOption,
        prefs: &UserPreferences,
        payment: Option<&PaymentInfo>,
        today: NaiveDate,
    ) -> Result<BookingOutcome, ResolveError> {
        let resolved = self.quote(itinerary, prefs, today)?;

        match payment.filter(|info| info.can_auto_book()) {
            Some(info) => {
                let booking_record = self.ledger.commit(&resolved.to_draft(), info)?;
                Ok(BookingOutcome::Booked {
                    resolved,
                    booking_record,
                })
            }
            None => {
                debug!(
                    total_price_idr = resolved.total_price_idr,
                    "No auto-book payment, returning simulation"
                );
                Ok(BookingOutcome::SimulationOnly { resolved })
            }
        }
    }

    // Contiguous stays in visiting order; the first starts on the trip's
    // start date. Cities allotted zero nights are skipped.
    fn book_stays(
        &self,
        allocation: &[NightAllocation],
        country: &str,
        style: TravelStyle,
        start_date: NaiveDate,
    ) -> Result<Vec<HotelStay>, ResolveError> {
        let mut stays = Vec::with_capacity(allocation.len());
        let mut stay_start = start_date;

        for entry in allocation.iter().filter(|entry| entry.nights > 0) {
            let stay_end = stay_start
                .checked_add_days(Days::new(u64::from(entry.nights - 1)))
                .unwrap_or(NaiveDate::MAX);

            let hotel = self
                .pick_hotel(&entry.city, country, style, stay_start, stay_end)
                .ok_or_else(|| ResolveError::NoHotelsAvailable {
                    city: entry.city.clone(),
                    style,
                })?;

            stays.push(HotelStay {
                hotel,
                nights: entry.nights,
                stay_start_date: stay_start,
                stay_end_date: stay_end,
            });
            stay_start = stay_start
                .checked_add_days(Days::new(u64::from(entry.nights)))
                .unwrap_or(NaiveDate::MAX);
        }

        Ok(stays)
    }

    // Requested tier first, then one step down
    fn pick_hotel(
        &self,
        city: &str,
        country: &str,
        style: TravelStyle,
        stay_start: NaiveDate,
        stay_end: NaiveDate,
    ) -> Option<HotelRecord> {
        let candidates = self
            .catalog
            .find_hotels_for_city(city, country, style, stay_start, stay_end);
        if let Some(hotel) = cheapest_hotel(&candidates) {
            return Some(hotel.clone());
        }

        let fallback = style.downgrade()?;
        let candidates = self
            .catalog
            .find_hotels_for_city(city, country, fallback, stay_start, stay_end);
        let hotel = cheapest_hotel(&candidates)?.clone();
        info!(
            city,
            requested = %style,
            fallback = %fallback,
            hotel_id = %hotel.id,
            "Downgraded hotel tier"
        );
        Some(hotel)
    }
}
