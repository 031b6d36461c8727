// Inventory catalog: read-only queries over countries, flights and hotels.
// Every result list keeps the store's insertion order.

use crate::models::{CountryCity, FlightRecord, HotelRecord, TravelStyle};
use crate::store::InventoryStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_FALLBACK_CANDIDATES: usize = 5;

fn same_place(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

// Flight candidates for both legs of a trip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightOptions {
    pub outbound: Vec<FlightRecord>,
    pub return_options: Vec<FlightRecord>,
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn InventoryStore>,
    fallback_candidates: usize,
}

impl Catalog {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            store,
            fallback_candidates: DEFAULT_FALLBACK_CANDIDATES,
        }
    }

    pub fn with_fallback_candidates(mut self, fallback_candidates: usize) -> Self {
        self.fallback_candidates = fallback_candidates;
        self
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    pub fn countries(&self) -> Vec<CountryCity> {
        self.store.countries()
    }

    /// Sorted, de-duplicated country names.
    pub fn country_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .store
            .countries()
            .into_iter()
            .map(|entry| entry.country)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Catalog entries for a country, matched case-insensitively.
    pub fn cities_for_country(&self, country: &str) -> Vec<CountryCity> {
        self.store
            .countries()
            .into_iter()
            .filter(|entry| same_place(&entry.country, country))
            .collect()
    }

    pub fn flights(&self) -> Vec<FlightRecord> {
        self.store.flights()
    }

    pub fn hotels(&self) -> Vec<HotelRecord> {
        self.store.hotels()
    }

    /// Seat-available flights on a route for `date`. When nothing departs that
    /// day, the closest dates on the route are offered instead, nearest first.
    pub fn find_flights(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Vec<FlightRecord> {
        let mut route: Vec<FlightRecord> = self
            .store
            .flights()
            .into_iter()
            .filter(|flight| {
                same_place(&flight.origin, origin)
                    && same_place(&flight.destination, destination)
                    && flight.seats_remaining > 0
            })
            .collect();

        let exact: Vec<FlightRecord> = route.iter().filter(|f| f.date == date).cloned().collect();
        if !exact.is_empty() {
            return exact;
        }

        // Stable sort, so equal distances stay in catalog order
        route.sort_by_key(|flight| (flight.date - date).num_days().abs());
        route.truncate(self.fallback_candidates);
        if !route.is_empty() {
            info!(
                origin,
                destination,
                %date,
                candidates = route.len(),
                "No flight on the requested date, offering nearest dates"
            );
        }
        route
    }

    /// Outbound `origin -> first_city` on `start_date` and return
    /// `last_city -> origin` on `return_date`.
    pub fn find_flights_for_trip(
        &self,
        origin: &str,
        first_city: &str,
        last_city: &str,
        start_date: NaiveDate,
        return_date: NaiveDate,
    ) -> FlightOptions {
        FlightOptions {
            outbound: self.find_flights(origin, first_city, start_date),
            return_options: self.find_flights(last_city, origin, return_date),
        }
    }

    /// Hotels of one style tier with rooms left whose availability window
    /// covers the whole stay.
    pub fn find_hotels_for_city(
        &self,
        city: &str,
        country: &str,
        style: TravelStyle,
        stay_start: NaiveDate,
        stay_end: NaiveDate,
    ) -> Vec<HotelRecord> {
        let hotels: Vec<HotelRecord> = self
            .store
            .hotels()
            .into_iter()
            .filter(|hotel| {
                same_place(&hotel.city, city)
                    && same_place(&hotel.country, country)
                    && style.matches_category(&hotel.category)
                    && hotel.rooms_remaining > 0
                    && hotel.covers(stay_start, stay_end)
            })
            .collect();
        debug!(city, country, %style, matches = hotels.len(), "Hotel search");
        hotels
    }
}
