use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Impact level of a company. Spanish names are canonical on the wire; the
/// English names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelImpact {
    #[serde(rename = "Bajo", alias = "Low")]
    Low,
    #[serde(rename = "Medio", alias = "Medium")]
    Medium,
    #[serde(rename = "Alto", alias = "High")]
    High,
}

impl LevelImpact {
    pub const ACCEPTED: &'static [&'static str] = &["Bajo", "Medio", "Alto", "Low", "Medium", "High"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelImpact::Low => "Bajo",
            LevelImpact::Medium => "Medio",
            LevelImpact::High => "Alto",
        }
    }
}

impl fmt::Display for LevelImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelImpact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bajo" | "Low" => Ok(LevelImpact::Low),
            "Medio" | "Medium" => Ok(LevelImpact::Medium),
            "Alto" | "High" => Ok(LevelImpact::High),
            other => Err(format!("unknown impact level '{}'", other)),
        }
    }
}

/// Earliest founding year accepted by the derived-trajectory rule.
pub const MIN_FOUNDING_YEAR: i32 = 1800;

/// Years of trajectory for a company founded in `founding_year`, as of
/// `current_year`. Never negative.
pub fn years_trajectory_from_founding(founding_year: i32, current_year: i32) -> i32 {
    (current_year - founding_year).max(0)
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// How the caller supplied the trajectory on create/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trajectory {
    Years(i32),
    FoundedIn(i32),
}

impl Trajectory {
    pub fn resolve(self, current_year: i32) -> i32 {
        match self {
            Trajectory::Years(years) => years,
            Trajectory::FoundedIn(year) => years_trajectory_from_founding(year, current_year),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub level_impact: LevelImpact,
    pub years_trajectory: i32,
    pub category: String,
    pub created_by: Uuid,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display-only subset of the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Company with its owner reference resolved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub level_impact: LevelImpact,
    pub years_trajectory: i32,
    pub category: String,
    pub created_by: Option<OwnerRef>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyView {
    pub fn new(company: Company, owner: Option<OwnerRef>) -> Self {
        Self {
            id: company.id,
            name: company.name,
            description: company.description,
            level_impact: company.level_impact,
            years_trajectory: company.years_trajectory,
            category: company.category,
            created_by: owner,
            status: company.status,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub description: String,
    pub level_impact: LevelImpact,
    pub years_trajectory: i32,
    pub category: String,
    pub created_by: Uuid,
}

impl NewCompany {
    pub fn into_company(self, now: DateTime<Utc>) -> Company {
        Company {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            level_impact: self.level_impact,
            years_trajectory: self.years_trajectory,
            category: self.category,
            created_by: self.created_by,
            status: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level_impact: Option<LevelImpact>,
    pub years_trajectory: Option<i32>,
    pub category: Option<String>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        *self == CompanyPatch::default()
    }

    pub fn apply(self, company: &mut Company, now: DateTime<Utc>) {
        if let Some(v) = self.name { company.name = v; }
        if let Some(v) = self.description { company.description = v; }
        if let Some(v) = self.level_impact { company.level_impact = v; }
        if let Some(v) = self.years_trajectory { company.years_trajectory = v; }
        if let Some(v) = self.category { company.category = v; }
        company.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trajectory_from_founding_year() {
        assert_eq!(years_trajectory_from_founding(2005, 2023), 18);
        assert_eq!(years_trajectory_from_founding(2023, 2023), 0);
        assert_eq!(years_trajectory_from_founding(2030, 2023), 0);
    }

    #[test]
    fn trajectory_resolves_both_variants() {
        assert_eq!(Trajectory::Years(5).resolve(2023), 5);
        assert_eq!(Trajectory::FoundedIn(2005).resolve(2023), 18);
    }

    #[test]
    fn level_impact_accepts_aliases() {
        let high: LevelImpact = serde_json::from_value(json!("High")).unwrap();
        let alto: LevelImpact = serde_json::from_value(json!("Alto")).unwrap();
        assert_eq!(high, alto);
        assert_eq!(serde_json::to_value(high).unwrap(), json!("Alto"));
        assert_eq!("Medium".parse::<LevelImpact>().unwrap(), LevelImpact::Medium);
    }
}
