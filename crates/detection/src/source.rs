//! 파일 기반 접근 로그 소스
//!
//! 단일 파일 또는 디렉토리의 모든 일반 파일을 읽어 줄 단위로 정규화하고,
//! 분석 창 안에 있는 엔트리만 돌려줍니다. 디렉토리는 파일 이름 순으로 읽습니다.

use std::path::{Path, PathBuf};

use honeywatch_core::error::{ConfigError, IngestionError};
use honeywatch_core::pipeline::LogSource;
use honeywatch_core::types::{AccessLogEntry, TimeRange};
use tracing::{debug, info, warn};

use crate::normalizer::{NormalizerRouter, normalize_batch};

const SOURCE_NAME: &str = "file";

/// 로컬 파일 시스템 로그 소스
pub struct FileLogSource {
    /// 파일 또는 디렉토리 경로
    path: PathBuf,
    /// 레코드 정규화기
    router: NormalizerRouter,
}

impl FileLogSource {
    /// 자동 형식 감지 라우터로 소스를 생성합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_router(path, NormalizerRouter::with_defaults())
    }

    /// 지정한 라우터로 소스를 생성합니다.
    pub fn with_router(path: impl Into<PathBuf>, router: NormalizerRouter) -> Self {
        Self {
            path: path.into(),
            router,
        }
    }

    /// `analysis.log_format` 값으로 소스를 생성합니다.
    pub fn for_format(path: impl Into<PathBuf>, format: &str) -> Result<Self, ConfigError> {
        Ok(Self::with_router(path, NormalizerRouter::for_format(format)?))
    }

    /// 읽을 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: String) -> IngestionError {
        IngestionError::Unavailable {
            source_name: SOURCE_NAME.to_owned(),
            reason: format!("{}: {reason}", self.path.display()),
        }
    }

    /// 읽을 파일 목록 (이름 순)
    async fn files(&self) -> Result<Vec<PathBuf>, IngestionError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        if metadata.is_file() {
            return Ok(vec![self.path.clone()]);
        }
        if !metadata.is_dir() {
            return Err(self.unavailable("not a regular file or directory".to_owned()));
        }

        let mut dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| self.unavailable(format!("failed to read directory: {e}")))?;

        let mut files = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| self.unavailable(format!("failed to read directory entry: {e}")))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if is_file && !hidden {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl LogSource for FileLogSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, window: &TimeRange) -> Result<Vec<AccessLogEntry>, IngestionError> {
        let files = self.files().await?;

        let mut entries = Vec::new();
        let mut skipped = 0;
        let mut outside = 0;

        for file in &files {
            let content = tokio::fs::read(file)
                .await
                .map_err(|e| self.unavailable(format!("failed to read {}: {e}", file.display())))?;

            let batch = normalize_batch(&self.router, content.split(|&b| b == b'\n'));
            debug!(
                file = %file.display(),
                entries = batch.entries.len(),
                skipped = batch.skipped,
                "log file normalized"
            );
            skipped += batch.skipped;

            for entry in batch.entries {
                if window.contains(entry.timestamp) {
                    entries.push(entry);
                } else {
                    outside += 1;
                }
            }
        }

        if entries.is_empty() && outside == 0 && skipped > 0 {
            return Err(IngestionError::Malformed {
                source_name: SOURCE_NAME.to_owned(),
                reason: format!(
                    "none of {skipped} records in {} matched the configured log format",
                    self.path.display()
                ),
            });
        }
        if skipped > 0 {
            warn!(skipped, path = %self.path.display(), "skipped malformed access log records");
        }

        info!(
            files = files.len(),
            entries = entries.len(),
            outside_window = outside,
            %window,
            "access logs loaded"
        );
        Ok(entries)
    }
}
