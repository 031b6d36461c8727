// Backing stores for inventory datasets, the booking ledger and the saved
// payment method. Catalog reads degrade to empty lists; writes fail loudly.

use crate::models::{BookingRecord, CountryCity, FlightRecord, HotelRecord};
use crate::payment::PaymentInfo;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

pub const COUNTRIES_FILE: &str = "countries.json";
pub const FLIGHTS_FILE: &str = "flights.json";
pub const HOTELS_FILE: &str = "hotels.json";
pub const BOOKINGS_FILE: &str = "bookings.json";
pub const PAYMENTS_FILE: &str = "payments.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error on {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// Inventory datasets. Insertion order of the returned lists is the
// tie-break order for every selection made on top of them.
pub trait InventoryStore: Send + Sync + 'static {
    fn countries(&self) -> Vec<CountryCity>;

    fn flights(&self) -> Vec<FlightRecord>;

    fn hotels(&self) -> Vec<HotelRecord>;

    // Take one seat from every flight whose id is listed, floored at zero.
    // Ids with no matching record are skipped. Returns the records touched.
    fn decrement_seats(&self, flight_ids: &[String]) -> Result<usize, StorageError>;

    // Same as decrement_seats for hotel rooms
    fn decrement_rooms(&self, hotel_ids: &[String]) -> Result<usize, StorageError>;
}

// Append-only booking ledger
pub trait BookingStore: Send + Sync + 'static {
    fn load_bookings(&self) -> Result<Vec<BookingRecord>, StorageError>;

    // Every persisted entry, including ones load_bookings cannot decode
    fn booking_count(&self) -> Result<usize, StorageError>;

    fn append_booking(&self, record: &BookingRecord) -> Result<(), StorageError>;
}

pub trait PaymentStore: Send + Sync + 'static {
    fn save_payment(&self, info: &PaymentInfo) -> Result<(), StorageError>;

    // Only a record flagged `has_payment` counts as a saved method
    fn load_payment(&self) -> Option<PaymentInfo>;
}

/// Deserializes each record on its own so one bad entry does not hide the
/// rest of the dataset.
pub fn parse_records<T: DeserializeOwned>(dataset: &str, values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(dataset, index, error = %err, "Skipping malformed record");
                None
            }
        })
        .collect()
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}

/// Store over a directory of JSON list files.
pub struct JsonFileStore {
    data_dir: PathBuf,
    // Serializes read-modify-write cycles issued through this handle
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    // Missing files, invalid JSON and non-list roots all read as an empty
    // list. Any other I/O failure is returned.
    fn read_list(&self, file: &str) -> Result<Vec<Value>, StorageError> {
        let path = self.path(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Dataset missing, using empty list");
                return Ok(Vec::new());
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => {
                warn!(path = %path.display(), "Dataset root is not a list, using empty list");
                Ok(Vec::new())
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Dataset is not valid JSON, using empty list"
                );
                Ok(Vec::new())
            }
        }
    }

    fn catalog_list<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        match self.read_list(file) {
            Ok(values) => parse_records(file, values),
            Err(err) => {
                warn!(error = %err, "Catalog read failed, using empty list");
                Vec::new()
            }
        }
    }

    fn write_json<T>(&self, file: &str, payload: &T) -> Result<(), StorageError>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path(file);
        fs::create_dir_all(&self.data_dir).map_err(|source| StorageError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        let body = serde_json::to_string_pretty(payload).map_err(|source| {
            StorageError::Serialization {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, body).map_err(|source| StorageError::Io { path, source })
    }

    // Works on raw JSON so fields this crate does not model survive the rewrite
    fn decrement(&self, file: &str, ids: &[String], field: &str) -> Result<usize, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock();
        let mut records = self.read_list(file)?;
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut touched = 0;
        for record in records.iter_mut() {
            let Some(object) = record.as_object_mut() else {
                continue;
            };
            let matches = object
                .get("id")
                .map(id_string)
                .map_or(false, |id| wanted.contains(id.as_str()));
            if !matches {
                continue;
            }

            let remaining = object.get(field).and_then(Value::as_u64).unwrap_or(0);
            object.insert(field.to_string(), Value::from(remaining.saturating_sub(1)));
            touched += 1;
        }

        if touched > 0 {
            self.write_json(file, &records)?;
        }
        Ok(touched)
    }
}

impl InventoryStore for JsonFileStore {
    fn countries(&self) -> Vec<CountryCity> {
        self.catalog_list(COUNTRIES_FILE)
    }

    fn flights(&self) -> Vec<FlightRecord> {
        self.catalog_list(FLIGHTS_FILE)
    }

    fn hotels(&self) -> Vec<HotelRecord> {
        self.catalog_list(HOTELS_FILE)
    }

    fn decrement_seats(&self, flight_ids: &[String]) -> Result<usize, StorageError> {
        self.decrement(FLIGHTS_FILE, flight_ids, "seats_left")
    }

    fn decrement_rooms(&self, hotel_ids: &[String]) -> Result<usize, StorageError> {
        self.decrement(HOTELS_FILE, hotel_ids, "rooms_left")
    }
}

impl BookingStore for JsonFileStore {
    fn load_bookings(&self) -> Result<Vec<BookingRecord>, StorageError> {
        let values = self.read_list(BOOKINGS_FILE)?;
        Ok(parse_records(BOOKINGS_FILE, values))
    }

    fn booking_count(&self) -> Result<usize, StorageError> {
        Ok(self.read_list(BOOKINGS_FILE)?.len())
    }

    fn append_booking(&self, record: &BookingRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut bookings = self.read_list(BOOKINGS_FILE)?;
        let value = serde_json::to_value(record).map_err(|source| StorageError::Serialization {
            path: self.path(BOOKINGS_FILE),
            source,
        })?;
        bookings.push(value);
        self.write_json(BOOKINGS_FILE, &bookings)
    }
}

impl PaymentStore for JsonFileStore {
    fn save_payment(&self, info: &PaymentInfo) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.write_json(PAYMENTS_FILE, info)
    }

    fn load_payment(&self) -> Option<PaymentInfo> {
        let path = self.path(PAYMENTS_FILE);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<PaymentInfo>(&raw) {
            Ok(info) if info.has_payment => Some(info),
            Ok(_) => None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring unreadable payment record");
                None
            }
        }
    }
}

/// In-process store for tests and embedding. Writes can be switched off to
/// exercise storage failures.
#[derive(Default)]
pub struct InMemoryStore {
    countries: RwLock<Vec<CountryCity>>,
    flights: RwLock<Vec<FlightRecord>>,
    hotels: RwLock<Vec<HotelRecord>>,
    bookings: RwLock<Vec<BookingRecord>>,
    payment: RwLock<Option<PaymentInfo>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new(
        countries: Vec<CountryCity>,
        flights: Vec<FlightRecord>,
        hotels: Vec<HotelRecord>,
    ) -> Self {
        Self {
            countries: RwLock::new(countries),
            flights: RwLock::new(flights),
            hotels: RwLock::new(hotels),
            ..Self::default()
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "in-memory store is switched off".to_string(),
            ));
        }
        Ok(())
    }
}

impl InventoryStore for InMemoryStore {
    fn countries(&self) -> Vec<CountryCity> {
        self.countries.read().clone()
    }

    fn flights(&self) -> Vec<FlightRecord> {
        self.flights.read().clone()
    }

    fn hotels(&self) -> Vec<HotelRecord> {
        self.hotels.read().clone()
    }

    fn decrement_seats(&self, flight_ids: &[String]) -> Result<usize, StorageError> {
        self.check_available()?;
        let mut flights = self.flights.write();
        let mut touched = 0;
        for flight in flights.iter_mut().filter(|f| flight_ids.contains(&f.id)) {
            flight.seats_remaining = flight.seats_remaining.saturating_sub(1);
            touched += 1;
        }
        Ok(touched)
    }

    fn decrement_rooms(&self, hotel_ids: &[String]) -> Result<usize, StorageError> {
        self.check_available()?;
        let mut hotels = self.hotels.write();
        let mut touched = 0;
        for hotel in hotels.iter_mut().filter(|h| hotel_ids.contains(&h.id)) {
            hotel.rooms_remaining = hotel.rooms_remaining.saturating_sub(1);
            touched += 1;
        }
        Ok(touched)
    }
}

impl BookingStore for InMemoryStore {
    fn load_bookings(&self) -> Result<Vec<BookingRecord>, StorageError> {
        self.check_available()?;
        Ok(self.bookings.read().clone())
    }

    fn booking_count(&self) -> Result<usize, StorageError> {
        self.check_available()?;
        Ok(self.bookings.read().len())
    }

    fn append_booking(&self, record: &BookingRecord) -> Result<(), StorageError> {
        self.check_available()?;
        self.bookings.write().push(record.clone());
        Ok(())
    }
}

impl PaymentStore for InMemoryStore {
    fn save_payment(&self, info: &PaymentInfo) -> Result<(), StorageError> {
        self.check_available()?;
        *self.payment.write() = Some(info.clone());
        Ok(())
    }

    fn load_payment(&self) -> Option<PaymentInfo> {
        self.payment
            .read()
            .clone()
            .filter(|info| info.has_payment)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::payment::CardBrand;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, value: Value) {
        fs::write(dir.path().join(file), value.to_string()).unwrap();
    }

    #[test]
    fn test_missing_datasets_read_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nowhere"));

        assert!(store.countries().is_empty());
        assert!(store.flights().is_empty());
        assert!(store.hotels().is_empty());
        assert!(store.load_bookings().unwrap().is_empty());
        assert!(store.load_payment().is_none());
    }

    #[test]
    fn test_invalid_json_and_non_list_roots_read_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FLIGHTS_FILE), "{ not json").unwrap();
        write(&dir, HOTELS_FILE, json!({"hotels": []}));
        let store = JsonFileStore::new(dir.path());

        assert!(store.flights().is_empty());
        assert!(store.hotels().is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped_individually() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            FLIGHTS_FILE,
            json!([
                {"id": "FL-1", "from": "Jakarta", "to": "Tokyo", "date": "2026-11-02", "base_price_idr": 500000, "seats_left": 2},
                {"id": "FL-2", "from": "Jakarta", "to": "Tokyo", "date": "not-a-date", "base_price_idr": 400000, "seats_left": 2},
                {"id": "FL-3", "from": "Jakarta", "to": "Osaka", "date": "2026-11-03", "base_price_idr": 450000, "seats_left": 1}
            ]),
        );
        let store = JsonFileStore::new(dir.path());

        let ids: Vec<String> = store.flights().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["FL-1", "FL-3"]);
    }

    #[test]
    fn test_file_decrement_floors_at_zero_and_keeps_unknown_fields() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            HOTELS_FILE,
            json!([
                {"id": "HT-1", "name": "A", "city": "Tokyo", "country": "Japan", "category": "luxury",
                 "price_per_night_idr": 3000000, "rooms_left": 1, "available_from": "2026-01-01",
                 "available_to": "2026-12-31", "stars": 5},
                {"id": "HT-2", "name": "B", "city": "Kyoto", "country": "Japan", "category": "luxury",
                 "price_per_night_idr": 2000000, "rooms_left": 4, "available_from": "2026-01-01",
                 "available_to": "2026-12-31"}
            ]),
        );
        let store = JsonFileStore::new(dir.path());
        let ids = vec!["HT-1".to_string(), "HT-404".to_string()];

        assert_eq!(store.decrement_rooms(&ids).unwrap(), 1);
        assert_eq!(store.decrement_rooms(&ids).unwrap(), 1);

        let body = fs::read_to_string(dir.path().join(HOTELS_FILE)).unwrap();
        let raw: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(raw[0]["rooms_left"], json!(0));
        assert_eq!(raw[0]["stars"], json!(5));
        assert_eq!(raw[1]["rooms_left"], json!(4));
    }

    #[test]
    fn test_file_bookings_append_in_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));

        for sequence in 1..=2 {
            let record = BookingRecord {
                booking_id: format!("BK-{:04}", sequence),
                created_at: chrono::Utc::now(),
                country: "Japan".to_string(),
                cities: vec!["Tokyo".to_string()],
                start_date: date(2026, 11, 2),
                end_date: date(2026, 11, 4),
                flight_ids: vec![],
                hotel_ids: vec![],
                stays: vec![],
                flight_details: vec![],
                total_price_idr: 1_000_000,
                payment_transaction_id: "pay_test".to_string(),
                card_last4: Some("1111".to_string()),
            };
            store.append_booking(&record).unwrap();
        }

        let ids: Vec<String> = store
            .load_bookings()
            .unwrap()
            .into_iter()
            .map(|b| b.booking_id)
            .collect();
        assert_eq!(ids, vec!["BK-0001", "BK-0002"]);
    }

    #[test]
    fn test_file_payment_round_trip_requires_has_payment() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut info = PaymentInfo {
            has_payment: true,
            card_last4: "4242".to_string(),
            card_brand: CardBrand::Visa,
            token_id: Some("tok_demo_1".to_string()),
            auto_book_allowed: false,
        };

        store.save_payment(&info).unwrap();
        assert_eq!(store.load_payment(), Some(info.clone()));

        info.has_payment = false;
        store.save_payment(&info).unwrap();
        assert_eq!(store.load_payment(), None);
    }

    #[test]
    fn test_in_memory_decrement_and_outage() {
        let store = InMemoryStore::new(
            vec![country("Japan", "Tokyo")],
            vec![flight("FL-1", "Jakarta", "Tokyo", date(2026, 11, 2), 500_000, 1)],
            vec![hotel("HT-1", "Tokyo", "backpacker", 300_000, 2)],
        );
        let ids = vec!["FL-1".to_string()];

        assert_eq!(store.decrement_seats(&ids).unwrap(), 1);
        assert_eq!(store.decrement_seats(&ids).unwrap(), 1);
        assert_eq!(store.flights()[0].seats_remaining, 0);

        store.set_unavailable(true);
        assert!(matches!(
            store.decrement_rooms(&["HT-1".to_string()]),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(store.hotels()[0].rooms_remaining, 2);
    }
}
