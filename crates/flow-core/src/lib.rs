//! 법인 순매수 수집기의 도메인 타입.
//!
//! - [`FlowRecord`]: 종목·거래일별 삼대 법인 순매수
//! - [`History`]: 날짜 기준 정렬·중복 제거된 레코드 이력
//! - [`calendar`]: 주말 판정, 조회 구간, 원천 API 날짜 표기

pub mod calendar;
pub mod history;
pub mod record;

pub use history::History;
pub use record::FlowRecord;
