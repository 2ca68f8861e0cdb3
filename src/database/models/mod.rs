pub mod company;
pub mod user;

pub use company::{
    Company, CompanyPatch, CompanyView, LevelImpact, NewCompany, OwnerRef, Trajectory,
};
pub use user::{NewUser, Role, User, UserPatch};
