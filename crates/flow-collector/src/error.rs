//! 에러 타입 정의.

use flow_data::DataError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 이력 저장 실패 (실행 실패로 처리)
    #[error("이력 저장 실패: {0}")]
    Persistence(#[source] DataError),

    /// 데이터 소스 초기화 에러
    #[error("데이터 소스 에러: {0}")]
    Data(#[from] DataError),

    /// 시도한 조회가 모두 실패
    #[error("모든 조회 실패: {attempted}건 시도")]
    AllFetchesFailed { attempted: usize },
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
