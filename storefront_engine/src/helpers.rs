use chrono::{DateTime, FixedOffset, Offset, Utc};
use rand::{distributions::Alphanumeric, Rng};

/// The storefront runs on Indochina Time (UTC+7). Order numbers are stamped in local time.
const STORE_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Generates an opaque order id, e.g. `ord_7fK2mQ9xLp0aZt4B`.
pub fn new_order_id() -> String {
    let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(16).map(char::from).collect();
    format!("ord_{suffix}")
}

/// Human-facing order number: `YYMMDDHHmmss` followed by the three millisecond digits, in store local time.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(STORE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset).format("%y%m%d%H%M%S%3f").to_string()
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_number_is_in_store_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 20, 15, 9).unwrap() + chrono::Duration::milliseconds(42);
        // 20:15 UTC is 03:15 the next day in UTC+7
        assert_eq!(generate_order_number(now), "240401031509042");
    }

    #[test]
    fn order_ids_are_unique() {
        let a = new_order_id();
        let b = new_order_id();
        assert!(a.starts_with("ord_"));
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
    }
}
