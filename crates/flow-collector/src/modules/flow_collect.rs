//! 1회 수집 실행: 로드 → 보충 → 저장.

use chrono::NaiveDate;
use flow_data::{AbsentReason, FlowProvider, JsonStore};
use tracing::{error, info};

use super::reconcile::reconcile;
use crate::{
    config::RewritePolicy, CollectionStats, CollectorConfig, CollectorError, Result,
};

/// 실행 결과 요약
#[derive(Debug, Clone)]
pub struct RunReport {
    /// 저장 파일을 다시 썼는지
    pub persisted: bool,
    /// 이력 내용이 바뀌었는지
    pub changed: bool,
    pub stats: CollectionStats,
    /// 저장 후 이력 레코드 수
    pub record_count: usize,
    pub absences: Vec<(NaiveDate, AbsentReason)>,
}

/// 저장된 이력을 읽어 누락 일자를 보충하고 결과를 저장합니다.
///
/// 조회 실패는 실행 실패가 아닙니다. 저장 실패만 에러로 전파되며,
/// `fail_on_total_fetch_failure`가 켜져 있으면 시도한 조회가 모두 실패한 경우
/// 저장을 마친 뒤 [`CollectorError::AllFetchesFailed`]를 반환합니다.
pub async fn collect_flows<P: FlowProvider + ?Sized>(
    config: &CollectorConfig,
    provider: &P,
    store: &JsonStore,
    today: NaiveDate,
) -> Result<RunReport> {
    let loaded = store.load_for_run();

    let outcome = reconcile(
        provider,
        &config.security_id,
        loaded.history,
        today,
        &config.reconcile,
    )
    .await;

    let changed = outcome.changed || loaded.needs_rewrite;
    let persist = match config.persist.rewrite_policy {
        RewritePolicy::Always => true,
        RewritePolicy::OnChange => changed,
    };

    if persist {
        store
            .save(&outcome.history)
            .map_err(CollectorError::Persistence)?;
        info!(
            path = %store.path().display(),
            records = outcome.history.len(),
            "이력 저장 완료"
        );
    } else {
        info!("변경 사항 없음, 저장 생략");
    }

    outcome.stats.log_summary("기관 순매수 수집");

    if config.persist.fail_on_total_fetch_failure && outcome.all_fetches_failed() {
        let attempted = outcome.stats.attempted();
        error!(attempted, "모든 조회가 실패했습니다");
        return Err(CollectorError::AllFetchesFailed { attempted });
    }

    Ok(RunReport {
        persisted: persist,
        changed,
        record_count: outcome.history.len(),
        stats: outcome.stats,
        absences: outcome.absences,
    })
}
