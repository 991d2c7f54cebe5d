//! 조회 구간 누락 일자 보충 모듈.
//!
//! 오늘을 포함한 최근 N일 중 주말과 이미 저장된 일자를 제외한 날짜만
//! 제공자에게 조회하고, 찾은 레코드를 이력에 병합한 뒤 보존 한도로 자릅니다.
//!
//! 조회는 한 번에 하나씩 순차적으로 수행하며, 첫 조회를 제외한 모든 조회 앞에
//! 예의상 무작위 딜레이를 둡니다.

use std::time::Instant;

use chrono::NaiveDate;
use flow_core::{
    calendar::{is_weekend, lookback_dates},
    History,
};
use flow_data::{AbsentReason, FetchOutcome, FlowProvider};
use tracing::{debug, info, warn};

use crate::{config::ReconcileConfig, CollectionStats};

/// 보충 결과
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// 병합·정렬·절삭이 끝난 이력
    pub history: History,
    /// 새 레코드가 추가되었거나 보존 한도로 잘렸는지
    pub changed: bool,
    pub stats: CollectionStats,
    /// 데이터를 얻지 못한 일자와 사유
    pub absences: Vec<(NaiveDate, AbsentReason)>,
}

impl ReconcileOutcome {
    /// 조회를 한 건 이상 시도했고 모두 전송/스키마 오류로 끝났는지
    pub fn all_fetches_failed(&self) -> bool {
        self.stats.attempted() > 0 && self.stats.errors == self.stats.attempted()
    }
}

/// 조회 구간 내 누락 일자를 보충합니다.
pub async fn reconcile<P: FlowProvider + ?Sized>(
    provider: &P,
    security_id: &str,
    mut history: History,
    today: NaiveDate,
    config: &ReconcileConfig,
) -> ReconcileOutcome {
    let start = Instant::now();
    let mut stats = CollectionStats::new();
    let mut absences = Vec::new();
    let mut changed = false;
    let mut first_call = true;

    let candidates = lookback_dates(today, config.lookback_days);
    stats.total = candidates.len();

    info!(
        provider = provider.name(),
        security_id,
        %today,
        lookback_days = config.lookback_days,
        existing = history.len(),
        "누락 일자 보충 시작"
    );

    for date in candidates {
        if is_weekend(date) {
            stats.weekend += 1;
            continue;
        }
        if history.contains(date) {
            debug!(%date, "이미 저장된 일자");
            stats.skipped += 1;
            continue;
        }

        if !first_call {
            tokio::time::sleep(config.request_delay()).await;
        }
        first_call = false;

        match provider.fetch(security_id, date).await {
            FetchOutcome::Found(record) => {
                debug!(
                    %date,
                    foreign = record.foreign_net,
                    trust = record.trust_net,
                    dealer = record.dealer_net,
                    "레코드 수집"
                );
                history.upsert(record);
                stats.success += 1;
                changed = true;
            }
            FetchOutcome::Absent(reason) => {
                if reason.is_failure() {
                    warn!(%date, %reason, "조회 실패, 다음 실행에서 재시도");
                    stats.errors += 1;
                } else {
                    debug!(%date, "데이터 없음 (휴장일 또는 미거래)");
                    stats.empty += 1;
                }
                absences.push((date, reason));
            }
        }
    }

    stats.dropped = history.truncate_to_latest(config.retention_cap);
    if stats.dropped > 0 {
        info!(
            dropped = stats.dropped,
            retention_cap = config.retention_cap,
            "보존 한도 초과 레코드 제거"
        );
        changed = true;
    }

    stats.elapsed = start.elapsed();

    ReconcileOutcome {
        history,
        changed,
        stats,
        absences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(success: usize, errors: usize, empty: usize) -> ReconcileOutcome {
        ReconcileOutcome {
            history: History::new(),
            changed: false,
            stats: CollectionStats {
                success,
                errors,
                empty,
                ..Default::default()
            },
            absences: Vec::new(),
        }
    }

    #[test]
    fn test_all_fetches_failed() {
        assert!(outcome(0, 3, 0).all_fetches_failed());
        assert!(!outcome(0, 0, 0).all_fetches_failed());
        assert!(!outcome(1, 2, 0).all_fetches_failed());
        assert!(!outcome(0, 2, 1).all_fetches_failed());
    }
}
