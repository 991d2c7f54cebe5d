//! 수집 통계 구조체.

use std::time::Duration;

use serde::Serialize;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStats {
    /// 조회 구간 내 후보 일수
    pub total: usize,
    /// 수집 성공 (이력에 병합됨)
    pub success: usize,
    /// 에러 (전송 실패, 스키마 불일치)
    pub errors: usize,
    /// 건너뛴 일수 (이미 이력에 있음)
    pub skipped: usize,
    /// 주말로 건너뛴 일수
    pub weekend: usize,
    /// 빈 데이터 (휴장일, 종목 없음)
    pub empty: usize,
    /// 보존 한도 초과로 제거된 레코드 수
    pub dropped: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 실제 API 호출 수
    pub fn attempted(&self) -> usize {
        self.success + self.errors + self.empty
    }

    /// 성공률 계산 (%)
    ///
    /// 빈 데이터(휴장일)는 정상 응답이므로 분모에는 포함하되 성공으로 세지 않습니다.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.attempted();
        if attempted == 0 {
            0.0
        } else {
            (self.success as f64 / attempted as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            weekend = self.weekend,
            empty = self.empty,
            dropped = self.dropped,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
