use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use easy_holiday::{
    resolver_for, BookingPolicy, CountryCity, FlightRecord, HotelRecord, InMemoryStore,
    ItineraryOption, SimulatedGateway, TravelStyle, UserPreferences,
};
use rand::{seq::SliceRandom, thread_rng, Rng};
use std::sync::Arc;

const CITIES: [&str; 5] = ["Tokyo", "Kyoto", "Osaka", "Sapporo", "Fukuoka"];
const STYLES: [&str; 3] = ["backpacker", "mid-range", "luxury"];

// Random inventory around a fixed trip window so most lookups find stock
fn random_store(flights_per_route: usize, hotels_per_city: usize) -> InMemoryStore {
    let mut rng = thread_rng();
    let base = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();

    let countries = CITIES
        .iter()
        .map(|city| CountryCity {
            country: "Japan".to_string(),
            city: city.to_string(),
        })
        .collect();

    let mut flights = Vec::new();
    for city in CITIES {
        for i in 0..flights_per_route {
            let date = base + Days::new(rng.gen_range(0..20));
            flights.push(FlightRecord {
                id: format!("OUT-{}-{}", city, i),
                origin: "Jakarta".to_string(),
                destination: city.to_string(),
                date,
                base_price: rng.gen_range(2_000_000..9_000_000),
                seats_remaining: rng.gen_range(0..10),
            });
            flights.push(FlightRecord {
                id: format!("RET-{}-{}", city, i),
                origin: city.to_string(),
                destination: "Jakarta".to_string(),
                date,
                base_price: rng.gen_range(2_000_000..9_000_000),
                seats_remaining: rng.gen_range(0..10),
            });
        }
    }

    let mut hotels = Vec::new();
    for city in CITIES {
        for i in 0..hotels_per_city {
            hotels.push(HotelRecord {
                id: format!("HT-{}-{}", city, i),
                name: format!("{} Hotel {}", city, i),
                city: city.to_string(),
                country: "Japan".to_string(),
                category: STYLES.choose(&mut rng).unwrap().to_string(),
                price_per_night: rng.gen_range(150_000..4_000_000),
                rooms_remaining: rng.gen_range(1..5),
                available_from: base,
                available_to: base + Days::new(60),
            });
        }
    }

    InMemoryStore::new(countries, flights, hotels)
}

pub fn resolver_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("itinerary_resolution");
    let today = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
    let prefs = UserPreferences {
        origin_country: "Indonesia".to_string(),
        origin_city: "Jakarta".to_string(),
        destination_country: "Japan".to_string(),
        trip_length_days: 7,
        start_date: NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
        travel_style: TravelStyle::Luxury,
        budget_idr: 40_000_000,
        preferences: vec![],
    };
    let itinerary = ItineraryOption::new("Japan", &["Tokyo", "Kyoto", "Osaka"], 7);

    // Catalog sizes per route / per city
    for size in [10, 100, 1000].iter() {
        let resolver = resolver_for(
            Arc::new(random_store(*size, *size)),
            Arc::new(SimulatedGateway),
            BookingPolicy::default(),
        );

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(resolver.quote(&itinerary, &prefs, today).ok()))
        });
    }

    group.finish();
}

criterion_group!(benches, resolver_benchmark);
criterion_main!(benches);
