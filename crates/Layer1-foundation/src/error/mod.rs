//! Error types for Vibepoints
//!
//! 옵션 파일 등 영속화 관련 에러

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Vibepoints 기반 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Persistence error: {0}")]
    Persistence(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Persistence 에러 헬퍼
    pub fn persistence(message: impl Into<String>) -> Self {
        Error::Persistence(message.into())
    }
}
