// Booking ledger: charges the saved payment method, appends the booking
// record and takes the booked seats and rooms out of inventory.
//
// Single-writer assumption: id sequencing, the ledger append and the
// inventory read-decrement are not guarded against concurrent commits.

use crate::models::{BookingRecord, FlightRecord, HotelStay};
use crate::payment::{PaymentError, PaymentGateway, PaymentInfo};
use crate::store::{BookingStore, InventoryStore, StorageError};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StorageError),

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Payment service unavailable: {0}")]
    PaymentUnavailable(String),
}

impl From<PaymentError> for LedgerError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Declined(reason) | PaymentError::InvalidCard(reason) => {
                LedgerError::PaymentDeclined(reason)
            }
            PaymentError::Unavailable(reason) => LedgerError::PaymentUnavailable(reason),
            PaymentError::Storage(err) => LedgerError::StorageFailure(err),
        }
    }
}

// Everything a commit writes, as selected by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub country: String,
    pub cities: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub flights: Vec<FlightRecord>,
    pub stays: Vec<HotelStay>,
    pub total_price_idr: u64,
}

pub fn format_booking_id(sequence: usize) -> String {
    format!("BK-{:04}", sequence)
}

#[derive(Clone)]
pub struct BookingLedger {
    inventory: Arc<dyn InventoryStore>,
    bookings: Arc<dyn BookingStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl BookingLedger {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        bookings: Arc<dyn BookingStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inventory,
            bookings,
            gateway,
        }
    }

    /// Persisted bookings, oldest first.
    pub fn bookings(&self) -> Result<Vec<BookingRecord>, LedgerError> {
        Ok(self.bookings.load_bookings()?)
    }

    /// Next id in the `BK-0001` sequence, derived from the number of
    /// persisted entries whether or not they decode.
    pub fn next_booking_id(&self) -> Result<String, LedgerError> {
        let existing = self.bookings.booking_count()?;
        Ok(format_booking_id(existing + 1))
    }

    /// Charges `payment` for the draft total, appends the booking record and
    /// decrements one seat per flight and one room per hotel.
    ///
    /// A failure before the append leaves nothing persisted. The append and
    /// the inventory writes are not atomic: if a decrement fails afterwards
    /// the record stays in the ledger and the error is still returned.
    pub fn commit(
        &self,
        draft: &BookingDraft,
        payment: &PaymentInfo,
    ) -> Result<BookingRecord, LedgerError> {
        let booking_id = self.next_booking_id()?;
        let receipt = self.gateway.charge(draft.total_price_idr, payment)?;

        let flight_ids: Vec<String> = draft.flights.iter().map(|f| f.id.clone()).collect();
        let hotel_ids: Vec<String> = draft.stays.iter().map(|s| s.hotel.id.clone()).collect();

        let record = BookingRecord {
            booking_id,
            created_at: Utc::now(),
            country: draft.country.clone(),
            cities: draft.cities.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            flight_ids: flight_ids.clone(),
            hotel_ids: hotel_ids.clone(),
            stays: draft.stays.iter().map(HotelStay::summary).collect(),
            flight_details: draft.flights.clone(),
            total_price_idr: draft.total_price_idr,
            payment_transaction_id: receipt.transaction_id,
            card_last4: Some(receipt.card_last4),
        };

        self.bookings.append_booking(&record)?;
        info!(
            booking_id = %record.booking_id,
            total_price_idr = record.total_price_idr,
            transaction_id = %record.payment_transaction_id,
            "Booking committed"
        );

        self.release_inventory(&record.booking_id, &flight_ids, &hotel_ids)?;
        Ok(record)
    }

    fn release_inventory(
        &self,
        booking_id: &str,
        flight_ids: &[String],
        hotel_ids: &[String],
    ) -> Result<(), LedgerError> {
        let seats = self.inventory.decrement_seats(flight_ids).map_err(|err| {
            error!(booking_id, error = %err, "Seat decrement failed after booking append");
            err
        })?;
        let rooms = self.inventory.decrement_rooms(hotel_ids).map_err(|err| {
            error!(booking_id, error = %err, "Room decrement failed after booking append");
            err
        })?;

        if seats < flight_ids.len() || rooms < hotel_ids.len() {
            debug!(
                booking_id,
                seats_decremented = seats,
                rooms_decremented = rooms,
                "Some booked ids were not found in inventory and were skipped"
            );
        }
        Ok(())
    }
}
