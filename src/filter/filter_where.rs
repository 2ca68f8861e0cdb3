use super::types::{CompanyFilter, SqlParam, SqlResult};

/// Builds parameterized WHERE clauses for list queries. Placeholders are
/// numbered from `$1`; callers append LIMIT/OFFSET placeholders after them.
pub struct FilterWhere {
    alias: String,
    params: Vec<SqlParam>,
    conditions: Vec<String>,
}

impl FilterWhere {
    fn new(alias: &str) -> Self {
        let mut w = Self {
            alias: alias.to_string(),
            params: vec![],
            conditions: vec![],
        };
        let status = w.column("status");
        w.conditions.push(format!("{} = TRUE", status));
        w
    }

    /// `alias` qualifies every column (e.g. `c` renders `c."status"`).
    pub fn active_only(alias: &str) -> SqlResult {
        Self::new(alias).finish()
    }

    pub fn company(filter: &CompanyFilter, alias: &str) -> SqlResult {
        let mut w = Self::new(alias);
        let years = w.column("years_trajectory");
        if let Some(min) = filter.min_years {
            w.push_raw(|n| format!("{} >= ${}", years, n), SqlParam::Int(min as i64));
        }
        if let Some(max) = filter.max_years {
            w.push_raw(|n| format!("{} <= ${}", years, n), SqlParam::Int(max as i64));
        }
        if let Some(ref category) = filter.category {
            let column = w.column("category");
            w.push_raw(|n| format!("LOWER({}) = LOWER(${})", column, n), SqlParam::Text(category.clone()));
        }
        w.finish()
    }

    fn column(&self, name: &str) -> String {
        qualify(&self.alias, name)
    }

    fn push_raw(&mut self, render: impl FnOnce(usize) -> String, param: SqlParam) {
        self.params.push(param);
        let n = self.params.len();
        self.conditions.push(render(n));
    }

    fn finish(self) -> SqlResult {
        SqlResult {
            query: self.conditions.join(" AND "),
            params: self.params,
        }
    }
}

pub(crate) fn qualify(alias: &str, column: &str) -> String {
    if alias.is_empty() {
        format!("\"{}\"", column)
    } else {
        format!("{}.\"{}\"", alias, column)
    }
}
