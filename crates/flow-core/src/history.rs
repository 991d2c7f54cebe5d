//! 날짜 기준으로 정렬·중복 제거된 레코드 이력.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::FlowRecord;

/// 레코드 이력.
///
/// 항상 날짜 오름차순이며 같은 날짜의 레코드는 하나만 존재합니다.
/// JSON으로는 레코드 배열 그대로 직렬화됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<FlowRecord>,
}

impl History {
    /// 빈 이력 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 임의 순서의 레코드로부터 이력 생성.
    ///
    /// 날짜를 키로 병합한 뒤 정렬된 시퀀스를 다시 만듭니다.
    /// 같은 날짜가 여러 번 나오면 나중 값이 남습니다.
    pub fn from_records(records: impl IntoIterator<Item = FlowRecord>) -> Self {
        let merged: BTreeMap<NaiveDate, FlowRecord> =
            records.into_iter().map(|r| (r.date, r)).collect();
        Self {
            records: merged.into_values().collect(),
        }
    }

    /// 해당 날짜 레코드 존재 여부
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.position(date).is_ok()
    }

    /// 해당 날짜 레코드 조회
    pub fn get(&self, date: NaiveDate) -> Option<&FlowRecord> {
        self.position(date).ok().map(|idx| &self.records[idx])
    }

    /// 날짜 기준 병합. 같은 날짜가 있으면 교체하고 이전 레코드를 반환합니다.
    pub fn upsert(&mut self, record: FlowRecord) -> Option<FlowRecord> {
        match self.position(record.date) {
            Ok(idx) => Some(std::mem::replace(&mut self.records[idx], record)),
            Err(idx) => {
                self.records.insert(idx, record);
                None
            }
        }
    }

    /// 최근 `cap`개만 남기고 오래된 레코드 제거.
    ///
    /// 제거된 레코드 수를 반환합니다.
    pub fn truncate_to_latest(&mut self, cap: usize) -> usize {
        let excess = self.records.len().saturating_sub(cap);
        if excess > 0 {
            self.records.drain(..excess);
        }
        excess
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 가장 오래된 레코드
    pub fn first(&self) -> Option<&FlowRecord> {
        self.records.first()
    }

    /// 가장 최근 레코드
    pub fn latest(&self) -> Option<&FlowRecord> {
        self.records.last()
    }

    /// 보유 중인 날짜 목록 (오름차순)
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.records.iter().map(|r| r.date)
    }

    pub fn into_records(self) -> Vec<FlowRecord> {
        self.records
    }

    fn position(&self, date: NaiveDate) -> Result<usize, usize> {
        self.records.binary_search_by_key(&date, |r| r.date)
    }
}

impl FromIterator<FlowRecord> for History {
    fn from_iter<I: IntoIterator<Item = FlowRecord>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, foreign: i64) -> FlowRecord {
        FlowRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            "4749",
            foreign,
            0,
            0,
        )
    }

    #[test]
    fn test_from_records_sorts_and_dedupes() {
        let history = History::from_records(vec![record(12, 1), record(10, 2), record(12, 3)]);

        let days: Vec<u32> = history.dates().map(|d| chrono::Datelike::day(&d)).collect();
        assert_eq!(days, vec![10, 12]);
        // 나중 값 우선
        assert_eq!(history.latest().unwrap().foreign_net, 3);
    }

    #[test]
    fn test_upsert_keeps_order() {
        let mut history = History::new();
        assert!(history.upsert(record(11, 1)).is_none());
        assert!(history.upsert(record(9, 2)).is_none());
        assert!(history.upsert(record(10, 3)).is_none());

        let replaced = history.upsert(record(10, 4));
        assert_eq!(replaced.unwrap().foreign_net, 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.first().unwrap().foreign_net, 2);
        assert_eq!(
            history
                .get(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
                .unwrap()
                .foreign_net,
            4
        );
    }

    #[test]
    fn test_truncate_to_latest_drops_oldest() {
        let mut history: History = (1..=5).map(|d| record(d, d as i64)).collect();

        assert_eq!(history.truncate_to_latest(3), 2);
        assert_eq!(history.len(), 3);
        assert_eq!(history.first().unwrap().foreign_net, 3);
        assert_eq!(history.latest().unwrap().foreign_net, 5);

        assert_eq!(history.truncate_to_latest(10), 0);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_serializes_as_array() {
        let history = History::from_records(vec![record(10, 1)]);
        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["date"], "2024-01-10");
    }
}
