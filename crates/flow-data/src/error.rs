//! 데이터 계층 에러 타입.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::provider::AbsentReason;

/// 데이터 계층 에러
#[derive(Debug, Error)]
pub enum DataError {
    /// 네트워크/HTTP 클라이언트 에러
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    /// 2xx 이외 응답
    #[error("HTTP 상태 오류: {0}")]
    Status(reqwest::StatusCode),

    /// JSON 파싱 실패
    #[error("JSON 파싱 실패: {0}")]
    Json(#[from] serde_json::Error),

    /// 알 수 없는 응답 구조
    #[error("예상하지 못한 응답 구조: {0}")]
    UnexpectedShape(String),

    /// 원천 날짜 표기로 변환 불가
    #[error("날짜 변환 실패: {0}")]
    DateConversion(NaiveDate),

    /// 행의 컬럼 수 부족
    #[error("행 컬럼 수 부족: {len}개 (최소 {min}개 필요)")]
    RowTooShort { len: usize, min: usize },

    /// 숫자 컬럼 파싱 실패
    #[error("숫자 파싱 실패 ({column}번 컬럼): {value:?}")]
    InvalidNumber { column: usize, value: String },

    /// 저장소 파일 I/O 실패
    #[error("저장소 I/O 실패 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    /// 행 구조 문제인지 (컬럼 수 부족, 숫자 형식 불일치)
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::RowTooShort { .. } | Self::InvalidNumber { .. })
    }

    /// 수집 루프가 사용하는 부재 사유로 변환.
    ///
    /// 행 구조 문제는 `SchemaMismatch`, 그 외(네트워크, 응답 형식 등)는 `Transport`.
    pub fn into_absent_reason(self) -> AbsentReason {
        if self.is_schema_mismatch() {
            AbsentReason::SchemaMismatch(self.to_string())
        } else {
            AbsentReason::Transport(self.to_string())
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, DataError>;
