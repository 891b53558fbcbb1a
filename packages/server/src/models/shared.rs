use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Highest page served. Keeps `offset()` within a signed 64-bit SQL OFFSET
/// for every allowed limit.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// Effective page window after applying defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Resolve raw `page`/`limit` query values.
    ///
    /// Unparseable values behave as absent, `page < 1` becomes 1 and pages
    /// past [`MAX_PAGE`] are capped. A limit outside `1..=100` falls back to 10
    /// rather than being clamped.
    pub fn resolve(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = (parse_lenient(page).unwrap_or(1).max(1) as u64).min(MAX_PAGE);
        let limit = match parse_lenient(limit) {
            Some(l) if (1..=MAX_PAGE_SIZE as i64).contains(&l) => l as u64,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_lenient(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
}

/// Trim `value`, mapping whitespace-only input to `None`.
pub fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Response for the health check.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Shorthand for a 400 with `message`.
pub fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}
