//! 법인 순매수 데이터 계층.
//!
//! - [`provider`]: 원천 API 조회와 위치 기반 표 파싱
//! - [`storage`]: JSON 파일 이력 저장소

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};
pub use provider::{
    AbsentReason, ColumnMap, FetchOutcome, FlowProvider, InstitutionalTradeClient, Market,
    ProviderConfig,
};
pub use storage::{JsonStore, LoadedHistory};
