use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NightAllocation {
    pub city: String,
    pub nights: u32,
}

/// Splits `total_days` across the cities in visiting order. Every city gets
/// `total_days / n`, and the first `total_days % n` cities get one more, so
/// the result always sums to `total_days`. Cities past the remainder get zero
/// nights when there are more cities than days.
pub fn allocate_nights(cities: &[String], total_days: u32) -> Vec<NightAllocation> {
    if cities.is_empty() {
        return Vec::new();
    }

    let count = cities.len() as u32;
    let base = total_days / count;
    let remainder = (total_days % count) as usize;

    cities
        .iter()
        .enumerate()
        .map(|(index, city)| NightAllocation {
            city: city.clone(),
            nights: base + u32::from(index < remainder),
        })
        .collect()
}

pub fn total_nights(allocations: &[NightAllocation]) -> u32 {
    allocations.iter().map(|allocation| allocation.nights).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn cities(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("city{}", i)).collect()
    }

    #[test_case(&["Tokyo"], 5, &[5] ; "single city")]
    #[test_case(&["Tokyo", "Kyoto"], 4, &[2, 2] ; "even split")]
    #[test_case(&["Tokyo", "Kyoto", "Osaka"], 7, &[3, 2, 2] ; "remainder to first")]
    #[test_case(&["Tokyo", "Kyoto", "Osaka"], 8, &[3, 3, 2] ; "remainder to first two")]
    #[test_case(&["Tokyo", "Kyoto", "Osaka"], 2, &[1, 1, 0] ; "more cities than days")]
    fn test_allocate_nights(names: &[&str], total_days: u32, expected: &[u32]) {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        let allocation = allocate_nights(&names, total_days);

        let nights: Vec<u32> = allocation.iter().map(|a| a.nights).collect();
        assert_eq!(nights, expected);
        let order: Vec<&str> = allocation.iter().map(|a| a.city.as_str()).collect();
        assert_eq!(order, names.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_allocation_always_sums_to_total_days() {
        for count in 1..=6 {
            for total_days in 1..=30 {
                let allocation = allocate_nights(&cities(count), total_days);
                assert_eq!(allocation.len(), count);
                assert_eq!(
                    total_nights(&allocation),
                    total_days,
                    "{} cities over {} days",
                    count,
                    total_days
                );
            }
        }
    }

    #[test]
    fn test_first_remainder_cities_get_one_extra_night() {
        for count in 1..=6usize {
            for total_days in count as u32..=30 {
                let allocation = allocate_nights(&cities(count), total_days);
                let remainder = (total_days % count as u32) as usize;
                let base = total_days / count as u32;

                for (index, entry) in allocation.iter().enumerate() {
                    let expected = if index < remainder { base + 1 } else { base };
                    assert_eq!(entry.nights, expected);
                }
            }
        }
    }

    #[test]
    fn test_repeated_city_keeps_its_own_share() {
        let names = vec!["Tokyo".to_string(), "Kyoto".to_string(), "Tokyo".to_string()];
        let allocation = allocate_nights(&names, 7);

        assert_eq!(total_nights(&allocation), 7);
        assert_eq!(allocation[0].nights, 3);
        assert_eq!(allocation[2].nights, 2);
    }

    #[test]
    fn test_no_cities_no_allocation() {
        assert!(allocate_nights(&[], 5).is_empty());
    }
}
