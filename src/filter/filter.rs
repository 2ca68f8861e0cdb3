use std::collections::HashMap;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::types::{CompanyFilter, Page};
use crate::database::models::Company;

/// Raw query-string parameters as received by a list handler.
pub type QueryParams = HashMap<String, String>;

impl Page {
    pub const LIMIT_PARAM: &'static str = "limite";
    pub const OFFSET_PARAM: &'static str = "desde";

    pub fn from_params(params: &QueryParams, default_limit: i64, max_limit: i64) -> Result<Self, FilterError> {
        let limit = match params.get(Self::LIMIT_PARAM) {
            Some(raw) => parse_i64(raw).ok_or_else(|| FilterError::InvalidLimit(format!("'{}' is not an integer", raw)))?,
            None => default_limit,
        };
        let offset = match params.get(Self::OFFSET_PARAM) {
            Some(raw) => parse_i64(raw).ok_or_else(|| FilterError::InvalidOffset(format!("'{}' is not an integer", raw)))?,
            None => 0,
        };
        Self::new(limit, offset, max_limit)
    }

    pub fn new(limit: i64, offset: i64, max_limit: i64) -> Result<Self, FilterError> {
        if limit < 1 { return Err(FilterError::InvalidLimit("Limit must be positive".to_string())); }
        if offset < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }

        let applied_limit = if limit > max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            max_limit
        } else {
            limit
        };

        Ok(Self { offset, limit: applied_limit })
    }

    /// Slice bounds of this page over `len` items.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = (self.offset.max(0) as usize).min(len);
        let end = start.saturating_add(self.limit.max(0) as usize).min(len);
        (start, end)
    }
}

impl CompanyFilter {
    pub fn from_params(params: &QueryParams) -> Result<Self, FilterError> {
        let min_years = parse_years(params, "minYears")?;
        let max_years = parse_years(params, "maxYears")?;
        if let (Some(min), Some(max)) = (min_years, max_years) {
            if min > max {
                return Err(FilterError::InvalidRange(format!("minYears ({}) is greater than maxYears ({})", min, max)));
            }
        }

        let category = params
            .get("category")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let order = params
            .get("order")
            .map(|o| FilterOrder::parse(o))
            .transpose()?;

        Ok(Self { min_years, max_years, category, order })
    }

    /// In-process evaluation of the same predicate the SQL backend generates.
    pub fn matches(&self, company: &Company) -> bool {
        if !company.status { return false; }
        if let Some(min) = self.min_years {
            if company.years_trajectory < min { return false; }
        }
        if let Some(max) = self.max_years {
            if company.years_trajectory > max { return false; }
        }
        if let Some(ref category) = self.category {
            if !company.category.eq_ignore_ascii_case(category) { return false; }
        }
        true
    }
}

fn parse_i64(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn parse_years(params: &QueryParams, key: &str) -> Result<Option<i32>, FilterError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|v| *v >= 0)
            .map(Some)
            .ok_or_else(|| FilterError::InvalidRange(format!("{} must be a non-negative integer", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{LevelImpact, NewCompany};
    use crate::filter::SortDirection;
    use chrono::Utc;
    use uuid::Uuid;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn company(years: i32, category: &str) -> Company {
        NewCompany {
            name: format!("c{}", years),
            description: "d".into(),
            level_impact: LevelImpact::Low,
            years_trajectory: years,
            category: category.into(),
            created_by: Uuid::new_v4(),
        }
        .into_company(Utc::now())
    }

    #[test]
    fn page_defaults_and_caps() {
        let page = Page::from_params(&params(&[]), 10, 100).unwrap();
        assert_eq!(page, Page { offset: 0, limit: 10 });

        let page = Page::from_params(&params(&[("limite", "500"), ("desde", "20")]), 10, 100).unwrap();
        assert_eq!(page, Page { offset: 20, limit: 100 });
    }

    #[test]
    fn page_rejects_bad_numbers() {
        assert!(matches!(Page::from_params(&params(&[("limite", "x")]), 5, 100), Err(FilterError::InvalidLimit(_))));
        assert!(matches!(Page::from_params(&params(&[("limite", "0")]), 5, 100), Err(FilterError::InvalidLimit(_))));
        assert!(matches!(Page::from_params(&params(&[("desde", "-1")]), 5, 100), Err(FilterError::InvalidOffset(_))));
    }

    #[test]
    fn page_bounds_clamp_to_len() {
        let page = Page { offset: 4, limit: 5 };
        assert_eq!(page.bounds(6), (4, 6));
        assert_eq!(page.bounds(2), (2, 2));
    }

    #[test]
    fn company_filter_parses_and_matches() {
        let filter = CompanyFilter::from_params(&params(&[
            ("minYears", "3"),
            ("maxYears", "10"),
            ("category", "tech"),
            ("order", "desc"),
        ]))
        .unwrap();
        assert_eq!(filter.order, Some(SortDirection::Desc));

        assert!(filter.matches(&company(5, "Tech")));
        assert!(!filter.matches(&company(2, "Tech")));
        assert!(!filter.matches(&company(11, "Tech")));
        assert!(!filter.matches(&company(5, "Food")));

        let mut inactive = company(5, "Tech");
        inactive.status = false;
        assert!(!filter.matches(&inactive));
    }

    #[test]
    fn company_filter_rejects_inverted_range() {
        let err = CompanyFilter::from_params(&params(&[("minYears", "10"), ("maxYears", "3")])).unwrap_err();
        assert!(matches!(err, FilterError::InvalidRange(_)));
    }
}
