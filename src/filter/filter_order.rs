use std::cmp::Ordering;

use super::error::FilterError;
use super::filter_where::qualify;
use super::types::SortDirection;

pub struct FilterOrder;

impl FilterOrder {
    pub fn parse(raw: &str) -> Result<SortDirection, FilterError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if trimmed.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(FilterError::InvalidOrder(format!("'{}' must be 'asc' or 'desc'", raw)))
        }
    }

    /// ORDER BY clause: by name when a direction is requested, insertion order otherwise.
    pub fn generate(order: Option<SortDirection>, alias: &str) -> String {
        let created = qualify(alias, "created_at");
        match order {
            Some(dir) => format!("ORDER BY LOWER({}) {}, {} ASC", qualify(alias, "name"), dir.to_sql(), created),
            None => format!("ORDER BY {} ASC", created),
        }
    }

    /// Case-insensitive comparison of two names in the requested direction.
    pub fn compare_names(a: &str, b: &str, dir: SortDirection) -> Ordering {
        let ord = a.to_lowercase().cmp(&b.to_lowercase());
        match dir {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directions() {
        assert_eq!(FilterOrder::parse("ASC").unwrap(), SortDirection::Asc);
        assert_eq!(FilterOrder::parse(" desc ").unwrap(), SortDirection::Desc);
        assert!(FilterOrder::parse("up").is_err());
    }

    #[test]
    fn generates_order_clause() {
        assert_eq!(
            FilterOrder::generate(Some(SortDirection::Desc), ""),
            "ORDER BY LOWER(\"name\") DESC, \"created_at\" ASC"
        );
        assert_eq!(FilterOrder::generate(None, "c"), "ORDER BY c.\"created_at\" ASC");
    }

    #[test]
    fn compares_case_insensitively() {
        assert_eq!(FilterOrder::compare_names("acme", "Beta", SortDirection::Asc), Ordering::Less);
        assert_eq!(FilterOrder::compare_names("acme", "Beta", SortDirection::Desc), Ordering::Greater);
    }
}
