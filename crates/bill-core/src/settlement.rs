//! Settlement watermark guards.
//!
//! Once a company is settled through date `D`, nothing dated on or before
//! `D` may be added or removed. The watermark is an append-only boundary
//! for the data it covers; moving the watermark itself is not guarded.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::EngineError;

/// Rejects dates on or before the watermark.
///
/// Applies to rate addition/removal (effective date), work-record deletion
/// (start date), and payment creation/deletion (payment date). A company
/// with no watermark accepts any date.
pub fn ensure_after_settlement(
    settled_through: Option<NaiveDate>,
    date: NaiveDate,
) -> Result<(), EngineError> {
    match settled_through {
        Some(watermark) if date <= watermark => Err(EngineError::SettledDate {
            date,
            settled_through: watermark,
        }),
        _ => Ok(()),
    }
}

/// Guard for new work time, keyed on the interval's end.
///
/// The end must reach at least the first midnight after the watermark;
/// anything earlier lies entirely in the settled period.
pub fn ensure_end_after_settlement(
    settled_through: Option<NaiveDate>,
    end: NaiveDateTime,
) -> Result<(), EngineError> {
    let Some(watermark) = settled_through else {
        return Ok(());
    };
    let open_from = (watermark + Days::new(1)).and_time(NaiveTime::MIN);
    if end < open_from {
        return Err(EngineError::SettledInterval {
            end,
            settled_through: watermark,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid date literal")
    }

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().expect("valid datetime literal")
    }

    #[test]
    fn unsettled_company_accepts_any_date() {
        assert!(ensure_after_settlement(None, date("1970-01-01")).is_ok());
        assert!(ensure_end_after_settlement(None, dt("1970-01-01T00:00:01")).is_ok());
    }

    #[test]
    fn date_on_the_watermark_is_frozen() {
        let err = ensure_after_settlement(Some(date("2000-01-02")), date("2000-01-02"))
            .expect_err("watermark day is frozen");
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
    }

    #[test]
    fn date_before_the_watermark_is_frozen() {
        assert!(ensure_after_settlement(Some(date("2000-01-02")), date("1999-12-31")).is_err());
    }

    #[test]
    fn date_after_the_watermark_passes() {
        assert!(ensure_after_settlement(Some(date("2000-01-02")), date("2000-01-03")).is_ok());
    }

    #[test]
    fn interval_end_boundary_is_the_first_open_midnight() {
        let watermark = Some(date("2000-01-02"));

        // Ending exactly at the first midnight after the watermark is open.
        assert!(ensure_end_after_settlement(watermark, dt("2000-01-03T00:00:00")).is_ok());

        let err = ensure_end_after_settlement(watermark, dt("2000-01-02T23:59:59"))
            .expect_err("still inside the settled period");
        assert!(matches!(err, EngineError::SettledInterval { .. }));
    }

    #[test]
    fn interval_well_past_the_watermark_passes() {
        let watermark = Some(date("2000-01-02"));
        assert!(ensure_end_after_settlement(watermark, dt("2000-01-05T09:00:00")).is_ok());
    }
}
