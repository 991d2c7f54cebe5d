//! 통합 테스트 공용 헬퍼

#![allow(dead_code)]

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use flow_collector::ReconcileConfig;
use flow_core::FlowRecord;
use flow_data::{AbsentReason, FetchOutcome, FlowProvider};
use tokio::time::Instant;

pub const SECURITY_ID: &str = "4749";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn record(date: NaiveDate, foreign: i64) -> FlowRecord {
    FlowRecord::new(date, SECURITY_ID, foreign, -foreign / 2, 1)
}

/// 딜레이 없는 보충 설정
pub fn reconcile_config(lookback_days: u32, retention_cap: usize) -> ReconcileConfig {
    ReconcileConfig {
        lookback_days,
        retention_cap,
        request_delay_min_ms: 0,
        request_delay_max_ms: 0,
    }
}

/// 일자별 응답이 정해진 제공자. 정해지지 않은 일자는 NotFound.
#[derive(Default)]
pub struct ScriptedProvider {
    outcomes: HashMap<NaiveDate, FetchOutcome>,
    calls: Mutex<Vec<(NaiveDate, Instant)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn found(mut self, record: FlowRecord) -> Self {
        self.outcomes.insert(record.date, FetchOutcome::Found(record));
        self
    }

    pub fn absent(mut self, date: NaiveDate, reason: AbsentReason) -> Self {
        self.outcomes.insert(date, FetchOutcome::Absent(reason));
        self
    }

    /// 호출된 일자 (호출 순서)
    pub fn called_dates(&self) -> Vec<NaiveDate> {
        self.calls.lock().unwrap().iter().map(|(d, _)| *d).collect()
    }

    /// 호출 시각 (호출 순서)
    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl FlowProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _security_id: &str, date: NaiveDate) -> FetchOutcome {
        self.calls.lock().unwrap().push((date, Instant::now()));
        self.outcomes
            .get(&date)
            .cloned()
            .unwrap_or_else(FetchOutcome::not_found)
    }
}
