//! Cumulative counter -> utilization rate conversion

use super::{RawEntity, RawPayload};
use crate::error::{ManagerError, ManagerResult};
use crate::models::{EntityPerformance, MetricPoint, PerformanceSnapshot};
use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Parse a collector timestamp with nanosecond precision.
///
/// RFC 3339 values keep their UTC offset (`...Z`, `...+02:00`). A value
/// without any zone designator is read as UTC.
pub fn parse_sample_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(ts).ok().or_else(|| {
        NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// Signed nanoseconds from `start` to `end`, offsets honored
pub fn elapsed_nanoseconds(
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
) -> Option<i64> {
    end.signed_duration_since(*start).num_nanoseconds()
}

/// Convert every entity of a raw payload into utilization points.
///
/// A series of N samples yields N-1 points; the first sample only serves as
/// the baseline for the second. Point order follows sample order.
pub fn compute_rates(payload: RawPayload) -> ManagerResult<PerformanceSnapshot> {
    payload
        .into_iter()
        .map(|(key, entity)| {
            let performance = entity_rates(&key, entity)?;
            Ok((key, performance))
        })
        .collect()
}

fn entity_rates(key: &str, entity: RawEntity) -> ManagerResult<EntityPerformance> {
    let timestamps = entity
        .stats
        .iter()
        .map(|sample| {
            parse_sample_timestamp(&sample.timestamp).ok_or_else(|| {
                ManagerError::InvalidPayload(format!(
                    "unparseable timestamp {:?} for {}",
                    sample.timestamp, key
                ))
            })
        })
        .collect::<ManagerResult<Vec<_>>>()?;

    let memory_limit = entity.spec.memory.limit;

    let stats = entity
        .stats
        .windows(2)
        .zip(timestamps.windows(2))
        .map(|(samples, times)| {
            let (prev, cur) = (&samples[0], &samples[1]);

            let cpu_delta = cur.cpu.usage.total as f64 - prev.cpu.usage.total as f64;
            let cores = cur.cpu.usage.per_cpu_usage.len();
            let cpu = match elapsed_nanoseconds(&times[0], &times[1]) {
                Some(elapsed) if elapsed > 0 && cores > 0 => {
                    Some(cpu_delta / elapsed as f64 / cores as f64)
                }
                _ => None,
            };

            let memory = if memory_limit > 0 {
                Some(cur.memory.usage as f64 / memory_limit as f64)
            } else {
                None
            };

            MetricPoint {
                timestamp: cur.timestamp.clone(),
                cpu,
                memory,
            }
        })
        .collect();

    let aliases = entity
        .aliases
        .into_iter()
        .filter(|alias| alias != key)
        .collect();

    Ok(EntityPerformance { aliases, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::{RawCpu, RawCpuUsage, RawMemory, RawMemorySpec, RawSample, RawSpec};

    fn sample(timestamp: &str, cpu_total: u64, cores: usize, memory: u64) -> RawSample {
        RawSample {
            timestamp: timestamp.to_string(),
            cpu: RawCpu {
                usage: RawCpuUsage {
                    total: cpu_total,
                    per_cpu_usage: vec![0; cores],
                },
            },
            memory: RawMemory { usage: memory },
        }
    }

    fn entity(aliases: &[&str], limit: u64, stats: Vec<RawSample>) -> RawEntity {
        RawEntity {
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            spec: RawSpec {
                memory: RawMemorySpec { limit },
            },
            stats,
        }
    }

    #[test]
    fn test_elapsed_nanoseconds_keeps_fraction() {
        let start = parse_sample_timestamp("2021-01-01T00:00:00.000000000Z").unwrap();
        let end = parse_sample_timestamp("2021-01-01T00:00:01.500000000Z").unwrap();
        assert_eq!(elapsed_nanoseconds(&start, &end), Some(1_500_000_000));

        let end = parse_sample_timestamp("2021-01-01T00:00:00.000000001Z").unwrap();
        assert_eq!(elapsed_nanoseconds(&start, &end), Some(1));
        assert_eq!(elapsed_nanoseconds(&end, &start), Some(-1));
    }

    #[test]
    fn test_parse_sample_timestamp_variants() {
        assert!(parse_sample_timestamp("2021-01-01T00:00:00.123Z").is_some());
        assert!(parse_sample_timestamp("2021-01-01T00:00:00Z").is_some());
        assert!(parse_sample_timestamp("2021-01-01T00:00:00.5").is_some());
        assert!(parse_sample_timestamp("2021-01-01 00:00:00").is_none());
        assert!(parse_sample_timestamp("").is_none());
    }

    #[test]
    fn test_parse_sample_timestamp_honors_offset() {
        let utc = parse_sample_timestamp("2021-01-01T00:00:00.000000000Z").unwrap();
        let local = parse_sample_timestamp("2021-01-01T02:00:00.000000000+02:00").unwrap();
        let naive = parse_sample_timestamp("2021-01-01T00:00:00.000000000").unwrap();

        assert_eq!(local, utc);
        assert_eq!(naive, utc);
        assert_eq!(elapsed_nanoseconds(&utc, &local), Some(0));
    }

    #[test]
    fn test_rates_from_offset_timestamps() {
        let mut payload = RawPayload::new();
        payload.insert(
            "e".to_string(),
            entity(
                &[],
                1000,
                vec![
                    sample("2021-01-01T02:00:00.000000000+02:00", 0, 2, 100),
                    // one second later, written in another zone
                    sample("2021-01-01T00:00:01.000000000Z", 1_000_000_000, 2, 500),
                    sample("2020-12-31T19:00:03.000000000-05:00", 3_000_000_000, 2, 500),
                ],
            ),
        );

        let stats = compute_rates(payload).unwrap().remove("e").unwrap().stats;

        assert_eq!(stats.len(), 2);
        assert!((stats[0].cpu.unwrap() - 0.5).abs() < 1e-12);
        assert!((stats[1].cpu.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(stats[1].timestamp, "2020-12-31T19:00:03.000000000-05:00");
        assert!((stats[1].memory.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cpu_fraction_from_counter_delta() {
        let mut payload = RawPayload::new();
        payload.insert(
            "/docker/abc".to_string(),
            entity(
                &["web"],
                1000,
                vec![
                    sample("2021-01-01T00:00:00.000000000Z", 1_000_000_000, 4, 100),
                    sample("2021-01-01T00:00:01.500000000Z", 4_000_000_000, 4, 250),
                ],
            ),
        );

        let snapshot = compute_rates(payload).unwrap();
        let stats = &snapshot["/docker/abc"].stats;

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].timestamp, "2021-01-01T00:00:01.500000000Z");
        assert!((stats[0].cpu.unwrap() - 0.5).abs() < 1e-12);
        assert!((stats[0].memory.unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_n_samples_yield_n_minus_one_points_in_order() {
        let samples = vec![
            sample("2021-01-01T00:00:00Z", 0, 2, 10),
            sample("2021-01-01T00:00:01Z", 1_000_000_000, 2, 20),
            sample("2021-01-01T00:00:02Z", 3_000_000_000, 2, 30),
            sample("2021-01-01T00:00:03Z", 3_000_000_000, 2, 40),
        ];
        let mut payload = RawPayload::new();
        payload.insert("e".to_string(), entity(&[], 100, samples));

        let stats = compute_rates(payload).unwrap().remove("e").unwrap().stats;

        assert_eq!(stats.len(), 3);
        let cpus: Vec<f64> = stats.iter().map(|p| p.cpu.unwrap()).collect();
        assert_eq!(cpus, vec![0.5, 1.0, 0.0]);
        let timestamps: Vec<&str> = stats.iter().map(|p| p.timestamp.as_str()).collect();
        assert_eq!(
            timestamps,
            vec![
                "2021-01-01T00:00:01Z",
                "2021-01-01T00:00:02Z",
                "2021-01-01T00:00:03Z"
            ]
        );
    }

    #[test]
    fn test_single_or_empty_series_yields_no_points() {
        let mut payload = RawPayload::new();
        payload.insert("one".to_string(), entity(&[], 100, vec![sample("2021-01-01T00:00:00Z", 1, 1, 1)]));
        payload.insert("none".to_string(), entity(&[], 100, vec![]));

        let snapshot = compute_rates(payload).unwrap();
        assert!(snapshot["one"].stats.is_empty());
        assert!(snapshot["none"].stats.is_empty());
    }

    #[test]
    fn test_self_alias_is_filtered() {
        let mut payload = RawPayload::new();
        payload.insert(
            "abc".to_string(),
            entity(&["web", "abc", "abcd"], 100, vec![]),
        );

        let snapshot = compute_rates(payload).unwrap();
        assert_eq!(snapshot["abc"].aliases, vec!["web", "abcd"]);
    }

    #[test]
    fn test_degenerate_samples_produce_null_rates() {
        let samples = vec![
            sample("2021-01-01T00:00:01Z", 0, 2, 10),
            // same timestamp
            sample("2021-01-01T00:00:01Z", 10, 2, 10),
            // out of order
            sample("2021-01-01T00:00:00Z", 20, 2, 10),
            // no cores reported
            sample("2021-01-01T00:00:05Z", 30, 0, 10),
        ];
        let mut payload = RawPayload::new();
        payload.insert("e".to_string(), entity(&[], 0, samples));

        let stats = compute_rates(payload).unwrap().remove("e").unwrap().stats;

        assert_eq!(stats.len(), 3);
        assert!(stats.iter().all(|p| p.cpu.is_none()));
        assert!(stats.iter().all(|p| p.memory.is_none()));
    }

    #[test]
    fn test_malformed_timestamp_is_invalid_payload() {
        let mut payload = RawPayload::new();
        payload.insert(
            "e".to_string(),
            entity(
                &[],
                100,
                vec![
                    sample("2021-01-01T00:00:00Z", 0, 1, 1),
                    sample("not a time", 1, 1, 1),
                ],
            ),
        );

        let err = compute_rates(payload).unwrap_err();
        assert!(matches!(err, ManagerError::InvalidPayload(_)));
    }
}
