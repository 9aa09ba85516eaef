use serde::Serialize;

use crate::utils::error::Validator;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Validated paging window. `page >= 1`, `limit` in `[1, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Parses raw `page`/`limit` query values, pushing field errors for
    /// anything that is not a positive integer in range. Absent values fall
    /// back to page 1 / limit 10.
    pub fn from_query(page: Option<&str>, limit: Option<&str>, v: &mut Validator) -> Self {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    v.push("page", "Page must be a positive integer");
                    DEFAULT_PAGE
                }
            },
        };

        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
                _ => {
                    v.push("limit", "Limit must be between 1 and 100");
                    DEFAULT_LIMIT
                }
            },
        };

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta {
            page: self.page,
            limit: self.limit,
            total,
            pages: if total == 0 {
                0
            } else {
                (total + self.limit - 1) / self.limit
            },
        }
    }
}

/// The `pagination` object of list responses.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(page: Option<&str>, limit: Option<&str>) -> (Pagination, bool) {
        let mut v = Validator::default();
        let p = Pagination::from_query(page, limit, &mut v);
        (p, v.is_empty())
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let (p, ok) = parse(None, None);
        assert!(ok);
        assert_eq!(p, Pagination { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn accepts_values_in_range() {
        let (p, ok) = parse(Some("3"), Some("25"));
        assert!(ok);
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 25);
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn rejects_zero_page_and_oversized_limit() {
        let (_, ok) = parse(Some("0"), Some("10"));
        assert!(!ok);
        let (_, ok) = parse(Some("1"), Some("101"));
        assert!(!ok);
        let (_, ok) = parse(Some("abc"), Some("10"));
        assert!(!ok);
    }

    #[test]
    fn page_count_rounds_up() {
        let p = Pagination { page: 1, limit: 10 };
        assert_eq!(p.meta(0).pages, 0);
        assert_eq!(p.meta(10).pages, 1);
        assert_eq!(p.meta(11).pages, 2);
        assert_eq!(p.meta(95).total, 95);
        assert_eq!(p.meta(95).pages, 10);
    }
}
