// Main library file for the vacation planner and booking simulator

// Leaf components first: data model, storage, catalog queries, night allocation
pub mod allocator;
pub mod catalog;
pub mod config;
pub mod models;
pub mod store;

// Booking flow
pub mod ledger;
pub mod payment;
pub mod resolver;

// Itinerary generation
pub mod llm_client;
pub mod planner;

// Re-export key types for convenience
pub use allocator::{allocate_nights, NightAllocation};
pub use catalog::{Catalog, FlightOptions};
pub use config::{AppConfig, BookingPolicy, ConfigError, LlmConfig};
pub use ledger::{BookingDraft, BookingLedger, LedgerError};
pub use llm_client::{LlmClient, LlmError, OllamaClient};
pub use models::{
    format_idr, BookingRecord, CountryCity, FlightRecord, HotelRecord, HotelStay, ItineraryOption,
    StaySummary, TravelStyle, UserPreferences,
};
pub use payment::{
    save_payment, PaymentError, PaymentGateway, PaymentInfo, PaymentReceipt, SimulatedGateway,
};
pub use planner::{ItineraryPlanner, PlannerError};
pub use resolver::{
    BookingOutcome, CostBreakdown, ItineraryResolver, ResolveError, ResolvedBooking,
};
pub use store::{
    BookingStore, InMemoryStore, InventoryStore, JsonFileStore, PaymentStore, StorageError,
};

use std::sync::Arc;

/// Wires a resolver over one store that serves both inventory and bookings.
pub fn resolver_for<S>(
    store: Arc<S>,
    gateway: Arc<dyn PaymentGateway>,
    policy: BookingPolicy,
) -> ItineraryResolver
where
    S: InventoryStore + BookingStore,
{
    let inventory: Arc<dyn InventoryStore> = store.clone();
    let bookings: Arc<dyn BookingStore> = store;
    ItineraryResolver::new(
        Catalog::new(inventory.clone()),
        BookingLedger::new(inventory, bookings, gateway),
        policy,
    )
}
