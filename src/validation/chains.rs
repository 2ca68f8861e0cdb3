// Per-route chains. Path parameters and the caller's id are merged into the
// checked object with `with_values` under the names used here.

use uuid::Uuid;

use super::predicates::{IsPresent, IsUnique, Present, Unique};
use super::rules::{IntRange, IsEmail, IsInt, IsString, IsUuid, Length, NotAllowed, OneOf};
use super::{Field, GroupMode, ValidationChain};
use crate::database::models::company::{current_year, MIN_FOUNDING_YEAR};
use crate::database::models::{LevelImpact, Role};

pub const TRAJECTORY_FIELDS: &[&str] = &["yearsTrajectory", "foundingYear"];

const MIN_PASSWORD: usize = 6;

fn name(field: &'static str) -> Field {
    Field::required(field).rule(IsString).rule(Length::between(1, 80))
}

fn optional_name(field: &'static str) -> Field {
    Field::optional(field).rule(IsString).rule(Length::between(1, 80))
}

fn phone() -> Field {
    Field::optional("phone").rule(IsString).rule(Length::between(7, 20))
}

fn id_param(field: &'static str) -> Field {
    Field::required(field).rule(IsUuid)
}

/// POST /auth/register
pub fn register() -> ValidationChain {
    ValidationChain::new()
        .field(name("name"))
        .field(name("surname"))
        .field(
            Field::required("username")
                .rule(Length::between(3, 30))
                .rule(IsUnique::new(Unique::Username, None)),
        )
        .field(
            Field::required("email")
                .rule(IsEmail)
                .rule(IsUnique::new(Unique::Email, None)),
        )
        .field(Field::required("password").rule(Length::at_least(MIN_PASSWORD)))
        .field(Field::required("role").rule(OneOf(Role::ALL)))
        .field(phone())
}

/// POST /auth/login
pub fn login() -> ValidationChain {
    ValidationChain::new()
        .field(Field::optional("email").rule(IsEmail))
        .field(Field::optional("username").rule(IsString).rule(Length::at_least(1)))
        .group(&["email", "username"], GroupMode::AtLeastOne)
        .field(Field::required("password").rule(IsString).rule(Length::at_least(1)))
}

/// GET /user/:uid
pub fn user_by_id() -> ValidationChain {
    ValidationChain::new().field(id_param("uid"))
}

fn user_patch(chain: ValidationChain, except: Option<Uuid>) -> ValidationChain {
    chain
        .field(optional_name("name"))
        .field(optional_name("surname"))
        .field(
            Field::optional("username")
                .rule(Length::between(3, 30))
                .rule(IsUnique::new(Unique::Username, except)),
        )
        .field(
            Field::optional("email")
                .rule(IsEmail)
                .rule(IsUnique::new(Unique::Email, except)),
        )
        .field(Field::optional("password").rule(Length::at_least(MIN_PASSWORD)))
        .field(phone())
        .field(Field::optional("status").rule(NotAllowed))
}

/// PUT /user/:uid. `uid` is the parsed path id when it is well formed.
pub fn update_user(uid: Option<Uuid>) -> ValidationChain {
    let chain = ValidationChain::new().field(id_param("uid"));
    user_patch(chain, uid).field(Field::optional("role").rule(OneOf(Role::ALL)))
}

/// PUT /user, checked against the caller's own record under `id`.
pub fn update_self(id: Uuid) -> ValidationChain {
    let chain = ValidationChain::new().field(Field::required("id").rule(IsPresent(Present::User)));
    user_patch(chain, Some(id)).field(Field::optional("role").rule(NotAllowed))
}

/// DELETE /user
pub fn delete_self() -> ValidationChain {
    ValidationChain::new().field(Field::required("id").rule(IsPresent(Present::User)))
}

fn founding_year() -> Field {
    Field::optional("foundingYear")
        .rule(IsInt)
        .rule(IntRange::between(MIN_FOUNDING_YEAR as i64, current_year() as i64))
}

fn years_trajectory() -> Field {
    Field::optional("yearsTrajectory").rule(IsInt).rule(IntRange::at_least(0))
}

/// POST /company
pub fn create_company() -> ValidationChain {
    ValidationChain::new()
        .field(
            Field::required("name")
                .rule(IsString)
                .rule(Length::between(1, 120))
                .rule(IsUnique::new(Unique::CompanyName, None)),
        )
        .field(Field::required("description").rule(IsString).rule(Length::between(1, 1000)))
        .field(Field::required("levelImpact").rule(OneOf(LevelImpact::ACCEPTED)))
        .field(years_trajectory())
        .field(founding_year())
        .group(TRAJECTORY_FIELDS, GroupMode::ExactlyOne)
        .field(Field::required("category").rule(IsString).rule(Length::between(1, 80)))
}

/// GET/DELETE /company/:id
pub fn company_by_id() -> ValidationChain {
    ValidationChain::new().field(id_param("id"))
}

/// PUT /company/:id
pub fn update_company(id: Option<Uuid>) -> ValidationChain {
    ValidationChain::new()
        .field(id_param("id"))
        .field(
            Field::optional("name")
                .rule(IsString)
                .rule(Length::between(1, 120))
                .rule(IsUnique::new(Unique::CompanyName, id)),
        )
        .field(Field::optional("description").rule(IsString).rule(Length::between(1, 1000)))
        .field(Field::optional("levelImpact").rule(OneOf(LevelImpact::ACCEPTED)))
        .field(years_trajectory())
        .field(founding_year())
        .group(TRAJECTORY_FIELDS, GroupMode::AtMostOne)
        .field(Field::optional("category").rule(IsString).rule(Length::between(1, 80)))
        .field(Field::optional("createdBy").rule(NotAllowed))
        .field(Field::optional("status").rule(NotAllowed))
}
