//! 데이터 수집 모듈.

pub mod flow_collect;
pub mod reconcile;

pub use flow_collect::{collect_flows, RunReport};
pub use reconcile::{reconcile, ReconcileOutcome};
