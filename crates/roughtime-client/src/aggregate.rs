// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Delay-corrected clock offset across a sequence.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{AggregateError, Result};
use crate::sequence::Outcome;

/// Estimate the local clock's offset from the authorities.
///
/// `t0` is the local time the sequence started. Each outcome's delay is
/// accumulated in order, failures included; every successful outcome with a
/// radius of at most `radius_threshold` contributes
/// `midpoint - t0 - accumulated_delay`. Returns the mean of the
/// contributions. A positive offset means the local clock is behind.
///
/// # Errors
///
/// [`AggregateError::NoResults`] for an empty slice,
/// [`AggregateError::NoValidResponses`] if nothing was accepted.
pub fn estimate_offset(
    outcomes: &[Outcome],
    t0: DateTime<Utc>,
    radius_threshold: Duration,
) -> Result<TimeDelta> {
    if outcomes.is_empty() {
        return Err(AggregateError::NoResults.into());
    }

    let mut elapsed = TimeDelta::zero();
    let mut sum = TimeDelta::zero();
    let mut accepted: i32 = 0;
    for outcome in outcomes {
        let delay = TimeDelta::from_std(outcome.delay).map_err(|_| AggregateError::OutOfRange)?;
        elapsed = elapsed
            .checked_add(&delay)
            .ok_or(AggregateError::OutOfRange)?;

        let Some(record) = outcome.record() else {
            continue;
        };
        if record.radius > radius_threshold {
            continue;
        }
        let offset = (record.midpoint - t0)
            .checked_sub(&elapsed)
            .ok_or(AggregateError::OutOfRange)?;
        sum = sum.checked_add(&offset).ok_or(AggregateError::OutOfRange)?;
        accepted = accepted.checked_add(1).ok_or(AggregateError::OutOfRange)?;
    }

    if accepted == 0 {
        return Err(AggregateError::NoValidResponses.into());
    }
    Ok(sum
        .checked_div(accepted)
        .ok_or(AggregateError::OutOfRange)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Authority;
    use crate::error::ClientError;
    use crate::query::QueryRecord;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn success(midpoint: DateTime<Utc>, radius: Duration, delay: Duration) -> Outcome {
        let record = QueryRecord {
            request: vec![],
            blind: vec![],
            reply: vec![],
            midpoint,
            radius,
        };
        Outcome::success(Authority::udp("ok", vec![0; 32], "h:1"), delay, record)
    }

    fn failure(delay: Duration) -> Outcome {
        Outcome::failure(
            Authority::udp("failed", vec![0; 32], "h:1"),
            delay,
            ClientError::NoReply,
        )
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_no_results() {
        let err = estimate_offset(&[], t0(), ms(100)).unwrap_err();
        assert!(matches!(err, ClientError::Aggregate(AggregateError::NoResults)));
    }

    #[test]
    fn test_all_failures() {
        let outcomes = vec![failure(ms(5)), failure(ms(5))];
        let err = estimate_offset(&outcomes, t0(), ms(100)).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Aggregate(AggregateError::NoValidResponses)
        ));
    }

    #[test]
    fn test_all_over_threshold() {
        let outcomes = vec![success(t0(), ms(500), ms(1))];
        let err = estimate_offset(&outcomes, t0(), ms(100)).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Aggregate(AggregateError::NoValidResponses)
        ));
    }

    #[test]
    fn test_mean_with_cumulative_delay() {
        let m1 = t0() + TimeDelta::seconds(2);
        let m2 = t0() + TimeDelta::seconds(3);
        let outcomes = vec![success(m1, ms(50), ms(10)), success(m2, ms(50), ms(20))];
        let offset = estimate_offset(&outcomes, t0(), ms(100)).unwrap();
        // ((2000 - 10) + (3000 - 30)) / 2
        assert_eq!(offset, TimeDelta::milliseconds(2480));
    }

    #[test]
    fn test_failure_delay_still_counts() {
        let outcomes = vec![
            failure(ms(100)),
            success(t0() + TimeDelta::seconds(1), ms(0), ms(50)),
        ];
        let offset = estimate_offset(&outcomes, t0(), ms(0)).unwrap();
        assert_eq!(offset, TimeDelta::milliseconds(850));
    }

    #[test]
    fn test_over_threshold_delay_still_counts() {
        let outcomes = vec![
            success(t0(), Duration::from_secs(60), ms(40)),
            success(t0(), ms(10), ms(10)),
        ];
        let offset = estimate_offset(&outcomes, t0(), ms(10)).unwrap();
        assert_eq!(offset, TimeDelta::milliseconds(-50));
    }
}
