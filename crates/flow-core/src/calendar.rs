//! 거래일 계산과 원천 API용 날짜 표기 변환.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// 중화민국(민국) 기년 오프셋 (민국 1년 = 1912년)
pub const ROC_YEAR_OFFSET: i32 = 1911;

/// 기본 거래소 타임존
pub const EXCHANGE_TIMEZONE: Tz = chrono_tz::Asia::Taipei;

/// 주말 여부 확인
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `today`를 포함해 거꾸로 `days`일 동안의 날짜 (오름차순).
///
/// `days`가 0이면 빈 목록을 반환합니다.
pub fn lookback_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = (0..days as u64)
        .map_while(|offset| today.checked_sub_days(Days::new(offset)))
        .collect();
    dates.reverse();
    dates
}

/// 민국 기년 날짜 문자열 (예: 2024-01-10 → "113/01/10").
///
/// 민국 원년 이전 날짜는 표기할 수 없으므로 `None`.
pub fn to_roc_date(date: NaiveDate) -> Option<String> {
    let year = date.year() - ROC_YEAR_OFFSET;
    if year < 1 {
        return None;
    }
    Some(format!("{}/{:02}/{:02}", year, date.month(), date.day()))
}

/// 구분자 없는 서기 날짜 문자열 (예: "20240110")
pub fn to_compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// 주어진 시각의 현지 날짜
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}
