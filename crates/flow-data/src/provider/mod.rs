//! 법인 순매수 데이터 제공자.
//!
//! 수집 루프는 [`FlowProvider`]만 알고, 실제 HTTP 호출·응답 파싱은
//! [`InstitutionalTradeClient`]가 담당합니다.
//!
//! 제공자는 에러를 던지지 않습니다. 휴장일, 미상장, 응답 이상, 네트워크 오류는
//! 모두 [`FetchOutcome::Absent`]로 돌려주고 사유만 구분합니다.

pub mod institutional;
pub mod table;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use flow_core::FlowRecord;

pub use institutional::{InstitutionalTradeClient, Market, ProviderConfig};
pub use table::ColumnMap;

/// 데이터가 없는 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// 해당 일자 표에 종목이 없음 (휴장일, 거래정지, 미상장). 정상 상황.
    NotFound,
    /// 네트워크, HTTP 상태, 응답 형식 오류
    Transport(String),
    /// 행은 있으나 컬럼 수 부족 또는 숫자 형식 불일치
    SchemaMismatch(String),
}

impl AbsentReason {
    /// 실패로 집계할 사유인지 (NotFound 제외)
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "데이터 없음"),
            Self::Transport(msg) => write!(f, "전송 실패: {}", msg),
            Self::SchemaMismatch(msg) => write!(f, "스키마 불일치: {}", msg),
        }
    }
}

/// 단일 일자 조회 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(FlowRecord),
    Absent(AbsentReason),
}

impl FetchOutcome {
    pub fn not_found() -> Self {
        Self::Absent(AbsentReason::NotFound)
    }

    pub fn record(&self) -> Option<&FlowRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::Absent(_) => None,
        }
    }
}

/// 일별 법인 순매수 제공자 trait.
#[async_trait]
pub trait FlowProvider: Send + Sync {
    /// 제공자 이름 (로그용)
    fn name(&self) -> &str;

    /// 한 종목의 특정 일자 데이터 조회.
    async fn fetch(&self, security_id: &str, date: NaiveDate) -> FetchOutcome;
}
