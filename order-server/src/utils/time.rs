//! 时间工具函数 — 营业日计算
//!
//! 订单编号按「门店营业日」分段：营业时区内、截止时刻（如 06:00）之前
//! 的订单计入前一日。所有调用方统一通过 [`effective_business_date`]
//! 取营业日，不得自行用 UTC 日历日。

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// 解析截止时刻字符串 (HH:MM)
pub fn parse_cutoff(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// 计算门店营业日
///
/// 营业时区本地时间早于 cutoff 时归属前一日。
///
/// ```text
/// cutoff = 06:00, tz = Europe/Madrid
/// 2024-03-09 23:50 local → 2024-03-09
/// 2024-03-10 01:20 local → 2024-03-09   (凌晨订单计入前一营业日)
/// 2024-03-10 06:00 local → 2024-03-10
/// ```
pub fn effective_business_date(now: DateTime<Utc>, tz: Tz, cutoff: NaiveTime) -> NaiveDate {
    let local = now.with_timezone(&tz);
    let date = local.date_naive();
    if local.time() < cutoff {
        date.pred_opt().unwrap_or(date)
    } else {
        date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_cutoff() {
        assert_eq!(parse_cutoff("06:00"), NaiveTime::from_hms_opt(6, 0, 0));
        assert_eq!(parse_cutoff("23:30"), NaiveTime::from_hms_opt(23, 30, 0));
        assert_eq!(parse_cutoff("6am"), None);
    }

    #[test]
    fn test_late_night_belongs_to_previous_day() {
        let tz = chrono_tz::UTC;
        let cutoff = NaiveTime::from_hms_opt(6, 0, 0).unwrap();

        let evening = Utc.with_ymd_and_hms(2024, 3, 9, 23, 50, 0).unwrap();
        assert_eq!(
            effective_business_date(evening, tz, cutoff),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );

        let small_hours = Utc.with_ymd_and_hms(2024, 3, 10, 1, 20, 0).unwrap();
        assert_eq!(
            effective_business_date(small_hours, tz, cutoff),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );

        let morning = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        assert_eq!(
            effective_business_date(morning, tz, cutoff),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }
}
