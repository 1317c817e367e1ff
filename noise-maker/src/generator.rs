use chrono::{DateTime, FixedOffset};
use rand::{Rng, seq::IndexedRandom};

const METHODS: [(&str, u8); 4] = [("GET", 6), ("POST", 2), ("PUT", 1), ("DELETE", 1)];
const PATHS: [(&str, u8); 8] = [
    ("/api/v2/banner/25019354", 30),
    ("/api/v2/banner/16852664", 20),
    ("/api/1/photogenic_banners/list/?server_name=WIN7RB4", 10),
    ("/api/v2/slot/4705/groups", 10),
    ("/api/v2/internal/html5/phantomjs/queue/?wait=1m", 2),
    ("/export/appinstall_raw/2017-06-29/", 5),
    ("/accounts/login/", 8),
    ("/", 15),
];
const STATUS: [(u16, u8); 5] = [(200, 80), (301, 5), (404, 8), (499, 2), (500, 5)];
const AGENTS: [(&str, u8); 4] = [
    ("Lynx/2.8.8dev.9 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/2.10.5", 5),
    ("Python-urllib/2.7", 3),
    ("Slotovod", 2),
    ("Mozilla/5.0 (Windows NT 6.1; rv:50.0) Gecko/20100101 Firefox/50.0", 10),
];
const GARBAGE: [&str; 4] = [
    "",
    "upstream timed out (110: Connection timed out)",
    "1.2.3.4 - - [broken",
    "\"GET /half-a-line HTTP/1.1\" 200 -",
];

/// One access log line in nginx `ui_short` format.
pub fn generate_ui_short_log<R: Rng + ?Sized>(rng: &mut R, at: DateTime<FixedOffset>) -> String {
    let ip = format!(
        "1.{}.{}.{}",
        rng.random_range(0..256),
        rng.random_range(0..256),
        rng.random_range(0..256)
    );
    let user = if rng.random_bool(0.2) {
        format!("{:x}", rng.random::<u64>() >> 12)
    } else {
        "-".to_string()
    };
    let timestamp = at.format("%d/%b/%Y:%H:%M:%S %z");
    let method = METHODS.choose_weighted(rng, |(_, w)| *w).unwrap().0;
    let path = PATHS.choose_weighted(rng, |(_, w)| *w).unwrap().0;
    let status = STATUS.choose_weighted(rng, |(_, w)| *w).unwrap().0;
    let agent = AGENTS.choose_weighted(rng, |(_, w)| *w).unwrap().0;
    let size = rng.random_range(0..20_000);
    let request_id = format!(
        "{}-{}-4708-{}",
        at.timestamp(),
        rng.random_range(1_000_000..4_000_000_000u64),
        rng.random_range(9_000_000..10_000_000)
    );
    // long tail: most requests are fast, a few are very slow
    let request_time = rng.random::<f64>().powi(4) * 5.0;

    format!(
        "{ip} {user}  - [{timestamp}] \"{method} {path} HTTP/1.1\" {status} {size} \"-\" \"{agent}\" \"-\" \"{request_id}\" \"-\" {request_time:.3}"
    )
}

/// A line that no access log pattern should accept.
pub fn generate_garbage_line<R: Rng + ?Sized>(rng: &mut R) -> String {
    GARBAGE.choose(rng).unwrap().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::{SeedableRng, rngs::StdRng};

    fn moment() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2017, 6, 29, 3, 50, 22)
            .unwrap()
    }

    #[test]
    fn ui_short_line_has_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let line = generate_ui_short_log(&mut rng, moment());
        assert!(line.contains("[29/Jun/2017:03:50:22 +0300]"));
        assert!(line.contains(" HTTP/1.1\" "));
        let request_time: f64 = line.rsplit(' ').next().unwrap().parse().unwrap();
        assert!((0.0..=5.0).contains(&request_time));
    }

    #[test]
    fn same_seed_same_output() {
        let a = generate_ui_short_log(&mut StdRng::seed_from_u64(42), moment());
        let b = generate_ui_short_log(&mut StdRng::seed_from_u64(42), moment());
        assert_eq!(a, b);
    }

    #[test]
    fn garbage_never_ends_with_a_request_time() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let line = generate_garbage_line(&mut rng);
            assert!(line.rsplit(' ').next().unwrap().parse::<f64>().is_err());
        }
    }
}
