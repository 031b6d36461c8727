use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Travel style tiers. Hotel categories use the same names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelStyle {
    Backpacker,
    MidRange,
    Luxury,
}

impl TravelStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelStyle::Backpacker => "backpacker",
            TravelStyle::MidRange => "mid-range",
            TravelStyle::Luxury => "luxury",
        }
    }

    /// The next cheaper tier tried when a city has no hotel in this one.
    pub fn downgrade(&self) -> Option<TravelStyle> {
        match self {
            TravelStyle::Luxury => Some(TravelStyle::MidRange),
            TravelStyle::MidRange => Some(TravelStyle::Backpacker),
            TravelStyle::Backpacker => None,
        }
    }

    pub fn matches_category(&self, category: &str) -> bool {
        category.trim().eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for TravelStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "backpacker" => Ok(TravelStyle::Backpacker),
            "mid-range" => Ok(TravelStyle::MidRange),
            "luxury" => Ok(TravelStyle::Luxury),
            other => Err(format!("unknown travel style '{}'", other)),
        }
    }
}

// Trip constraints entered by the traveller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserPreferences {
    pub origin_country: String,
    pub origin_city: String,
    pub destination_country: String,
    pub trip_length_days: u32,
    pub start_date: NaiveDate,
    pub travel_style: TravelStyle,
    pub budget_idr: u64,
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl UserPreferences {
    /// Last day of the trip: `start_date + (trip_length_days - 1)`.
    pub fn end_date(&self) -> NaiveDate {
        let extra_days = u64::from(self.trip_length_days.saturating_sub(1));
        self.start_date
            .checked_add_days(Days::new(extra_days))
            .unwrap_or(NaiveDate::MAX)
    }
}

// Data structures for generated itineraries. Everything except the city
// sequence is advisory.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ItineraryOption {
    #[serde(default)]
    pub option_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub destination_country: String,
    pub cities: Vec<String>,
    pub total_days: u32,
    #[serde(default)]
    pub estimated_total_budget_idr: Option<f64>,
    #[serde(default)]
    pub budget_breakdown: Option<BudgetBreakdown>,
    #[serde(default)]
    pub daily_schedule: Vec<DaySchedule>,
}

impl ItineraryOption {
    pub fn new(destination_country: &str, cities: &[&str], total_days: u32) -> Self {
        Self {
            option_id: None,
            title: None,
            destination_country: destination_country.to_string(),
            cities: cities.iter().map(|city| city.to_string()).collect(),
            total_days,
            estimated_total_budget_idr: None,
            budget_breakdown: None,
            daily_schedule: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BudgetBreakdown {
    pub flights: Option<f64>,
    pub accommodation: Option<f64>,
    pub activities: Option<f64>,
    pub local_transport: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DaySchedule {
    pub day_number: u32,
    pub city: String,
    pub date_offset_from_start: u32,
    pub slots: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleSlot {
    pub time: String,
    pub place: String,
    pub activity: String,
    pub notes: String,
    pub estimated_cost_idr: Option<f64>,
}

// Data structures for the inventory datasets. Field names on the wire follow
// the dataset files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CountryCity {
    pub country: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FlightRecord {
    pub id: String,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub date: NaiveDate,
    #[serde(rename = "base_price_idr")]
    pub base_price: u64,
    #[serde(rename = "seats_left")]
    pub seats_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HotelRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub city: String,
    pub country: String,
    pub category: String,
    #[serde(rename = "price_per_night_idr")]
    pub price_per_night: u64,
    #[serde(rename = "rooms_left")]
    pub rooms_remaining: u32,
    pub available_from: NaiveDate,
    pub available_to: NaiveDate,
}

impl HotelRecord {
    /// True when the inclusive availability window holds the whole stay.
    pub fn covers(&self, stay_start: NaiveDate, stay_end: NaiveDate) -> bool {
        self.available_from <= stay_start
            && stay_start <= self.available_to
            && self.available_from <= stay_end
            && stay_end <= self.available_to
    }
}

// A hotel bound to one leg of the trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotelStay {
    pub hotel: HotelRecord,
    pub nights: u32,
    pub stay_start_date: NaiveDate,
    pub stay_end_date: NaiveDate,
}

impl HotelStay {
    pub fn cost(&self) -> u64 {
        self.hotel
            .price_per_night
            .saturating_mul(u64::from(self.nights))
    }

    pub fn summary(&self) -> StaySummary {
        StaySummary {
            hotel_id: self.hotel.id.clone(),
            hotel_name: self.hotel.name.clone(),
            city: self.hotel.city.clone(),
            country: self.hotel.country.clone(),
            nights: self.nights,
            stay_start_date: self.stay_start_date,
            stay_end_date: self.stay_end_date,
            category: self.hotel.category.clone(),
            price_per_night_idr: self.hotel.price_per_night,
        }
    }
}

// Per-city row of a stay plan, also persisted inside booking records
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaySummary {
    pub hotel_id: String,
    pub hotel_name: String,
    pub city: String,
    pub country: String,
    pub nights: u32,
    pub stay_start_date: NaiveDate,
    pub stay_end_date: NaiveDate,
    pub category: String,
    pub price_per_night_idr: u64,
}

// Persisted booking. Created once per committed booking, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub created_at: DateTime<Utc>,
    pub country: String,
    pub cities: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub flight_ids: Vec<String>,
    pub hotel_ids: Vec<String>,
    pub stays: Vec<StaySummary>,
    pub flight_details: Vec<FlightRecord>,
    pub total_price_idr: u64,
    pub payment_transaction_id: String,
    pub card_last4: Option<String>,
}

/// Formats an amount the way the booking screens show it, e.g. `IDR 1.500.000`.
pub fn format_idr(value: Option<u64>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };

    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    format!("IDR {}", grouped)
}
