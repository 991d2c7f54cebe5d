//! JSON 파일 기반 이력 저장소.
//!
//! - 수집 실행 중 읽기 실패(파일 손상 등)는 치명적이지 않습니다. 손상 파일은
//!   `<name>.corrupt.<unix_ts>`로 격리하고 빈 이력으로 시작합니다.
//!   조회 전용 경로([`JsonStore::load`], [`JsonStore::try_load`])는 파일을 옮기지 않습니다.
//! - 쓰기는 `.tmp`에 기록한 뒤 rename 하여 원자적으로 교체합니다.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use flow_core::{FlowRecord, History};
use tracing::{debug, info, warn};

use crate::error::{DataError, Result};

/// 이력 JSON 저장소
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

/// 수집 실행용 로드 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedHistory {
    pub history: History,
    /// 저장 파일이 정규 형식(정렬, 중복 없음, 현재 필드명, pretty 출력)과 달라
    /// 새 레코드가 없어도 다시 써야 하는지
    pub needs_rewrite: bool,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 저장된 레코드 읽기. 파일이 없으면 `Ok(None)`. 파일을 변경하지 않습니다.
    pub fn try_load(&self) -> Result<Option<Vec<FlowRecord>>> {
        Ok(self.read_raw()?.map(|(_, records)| records))
    }

    /// 조회 전용 이력 로드.
    ///
    /// 파일이 없거나 읽을 수 없으면 빈 이력을 반환하며, 손상 파일도 그대로 둡니다.
    pub fn load(&self) -> History {
        match self.try_load() {
            Ok(records) => History::from_records(records.unwrap_or_default()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "이력 읽기 실패");
                History::new()
            }
        }
    }

    /// 수집 실행용 이력 로드.
    ///
    /// 로드된 레코드는 날짜 기준으로 정렬·중복 제거됩니다. 읽을 수 없는 파일은
    /// 격리한 뒤 빈 이력으로 시작합니다.
    pub fn load_for_run(&self) -> LoadedHistory {
        match self.read_raw() {
            Ok(Some((content, records))) => {
                let loaded = records.len();
                let history = History::from_records(records);
                if history.len() != loaded {
                    warn!(
                        path = %self.path.display(),
                        loaded,
                        unique = history.len(),
                        "중복 날짜 레코드 병합"
                    );
                }
                let needs_rewrite =
                    render(&history).map_or(true, |canonical| canonical != content);
                if needs_rewrite {
                    info!(path = %self.path.display(), "저장 파일을 정규 형식으로 다시 씁니다");
                }
                debug!(path = %self.path.display(), records = history.len(), "이력 로드 완료");
                LoadedHistory {
                    history,
                    needs_rewrite,
                }
            }
            Ok(None) => {
                info!(path = %self.path.display(), "저장 파일 없음, 빈 이력으로 시작");
                LoadedHistory {
                    history: History::new(),
                    needs_rewrite: false,
                }
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "이력 로드 실패, 빈 이력으로 시작");
                self.quarantine();
                LoadedHistory {
                    history: History::new(),
                    needs_rewrite: false,
                }
            }
        }
    }

    /// 이력 저장 (pretty JSON, 원자적 교체).
    pub fn save(&self, history: &History) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = render(history)?;

        let tmp_path = self.sibling_path("tmp");
        fs::write(&tmp_path, json).map_err(|e| self.io_error(e))?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.io_error(e)
        })?;

        debug!(path = %self.path.display(), records = history.len(), "이력 저장 완료");
        Ok(())
    }

    fn read_raw(&self) -> Result<Option<(String, Vec<FlowRecord>)>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let records: Vec<FlowRecord> = serde_json::from_str(&content)?;
        Ok(Some((content, records)))
    }

    /// 손상 파일을 `<name>.corrupt.<unix_ts>`로 이동 (실패해도 무시).
    ///
    /// 이전에 격리된 파일은 덮어쓰지 않습니다.
    fn quarantine(&self) {
        if !self.path.exists() {
            return;
        }
        let target = self.quarantine_path();
        match fs::rename(&self.path, &target) {
            Ok(()) => warn!(path = %target.display(), "손상된 저장 파일 격리"),
            Err(e) => warn!(error = %e, "손상된 저장 파일 격리 실패"),
        }
    }

    fn quarantine_path(&self) -> PathBuf {
        let base = format!("corrupt.{}", Utc::now().timestamp());
        let mut target = self.sibling_path(&base);
        let mut seq = 1;
        while target.exists() {
            target = self.sibling_path(&format!("{}-{}", base, seq));
            seq += 1;
        }
        target
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("history.json"));
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> DataError {
        DataError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// 저장 형식 문자열 (pretty JSON + 개행)
fn render(history: &History) -> Result<String> {
    let mut json = serde_json::to_string_pretty(history)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32) -> FlowRecord {
        FlowRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            "4749",
            100,
            -10,
            5,
        )
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data.json"));
        assert!(store.load().is_empty());
        assert!(store.try_load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested").join("data.json"));
        let history = History::from_records(vec![record(11), record(10)]);

        store.save(&history).unwrap();
        assert_eq!(
            store.load_for_run(),
            LoadedHistory {
                history,
                needs_rewrite: false
            }
        );
        assert!(!dir.path().join("nested").join("data.json.tmp").exists());
    }

    #[test]
    fn test_saved_format_is_pretty_with_stable_field_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data.json"));
        store
            .save(&History::from_records(vec![record(10).with_total(95)]))
            .unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let expected = "[\n  {\n    \"date\": \"2024-01-10\",\n    \"security_id\": \"4749\",\n    \"foreign_net\": 100,\n    \"trust_net\": -10,\n    \"dealer_net\": 5,\n    \"total_net\": 95\n  }\n]\n";
        assert_eq!(content, expected);
    }

    fn corrupt_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("data.json.corrupt"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_corrupt_file_is_quarantined_on_run_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded = JsonStore::new(&path).load_for_run();
        assert!(loaded.history.is_empty());
        assert!(!loaded.needs_rewrite);
        assert!(!path.exists());
        assert_eq!(corrupt_files(dir.path()).len(), 1);
    }

    #[test]
    fn test_read_only_load_leaves_corrupt_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{ truncated").unwrap();

        let store = JsonStore::new(&path);
        assert!(store.try_load().is_err());
        assert!(store.load().is_empty());

        assert_eq!(fs::read_to_string(&path).unwrap(), "{ truncated");
        assert!(corrupt_files(dir.path()).is_empty());
    }

    #[test]
    fn test_repeated_quarantine_keeps_every_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = JsonStore::new(&path);

        fs::write(&path, "[{\"date\":\"2024-01-10\", FIRST").unwrap();
        store.load_for_run();
        fs::write(&path, "SECOND").unwrap();
        store.load_for_run();

        let names = corrupt_files(dir.path());
        assert_eq!(names.len(), 2);
        let mut contents: Vec<String> = names
            .iter()
            .map(|name| fs::read_to_string(dir.path().join(name)).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["SECOND", "[{\"date\":\"2024-01-10\", FIRST"]);
    }

    #[test]
    fn test_legacy_file_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"[
  {"date": "2024-01-11", "stock_id": "4749", "foreign_investors": 1, "investment_trust": 2, "dealer": 3},
  {"date": "2024-01-10", "stock_id": "4749", "foreign_investors": 4, "investment_trust": 5, "dealer": 6},
  {"date": "2024-01-11", "stock_id": "4749", "foreign_investors": 7, "investment_trust": 8, "dealer": 9}
]"#,
        )
        .unwrap();

        let LoadedHistory {
            history,
            needs_rewrite,
        } = JsonStore::new(&path).load_for_run();
        assert!(needs_rewrite);
        assert_eq!(history.len(), 2);
        assert_eq!(history.first().unwrap().foreign_net, 4);
        assert_eq!(history.latest().unwrap().foreign_net, 7);
    }

    #[test]
    fn test_sorted_legacy_field_names_need_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"[
  {"date": "2024-01-10", "stock_id": "4749", "foreign_investors": 4, "investment_trust": 5, "dealer": 6}
]"#,
        )
        .unwrap();

        let store = JsonStore::new(&path);
        let loaded = store.load_for_run();
        assert!(loaded.needs_rewrite);

        store.save(&loaded.history).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"foreign_net\": 4"));
        assert!(!content.contains("stock_id"));
        assert!(!store.load_for_run().needs_rewrite);
    }
}
