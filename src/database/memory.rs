use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    Company, CompanyPatch, CompanyView, NewCompany, NewUser, OwnerRef, Role, User, UserPatch,
};
use crate::database::store::{Store, StoreError};
use crate::filter::{CompanyFilter, FilterOrder, Page, Paged};

/// In-process store with the same unique constraints as the Postgres schema.
/// Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    companies: Vec<Company>,
}

impl Inner {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn owner_of(&self, company: &Company) -> Option<OwnerRef> {
        self.user(company.created_by).map(|u| OwnerRef {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        })
    }

    fn view(&self, company: &Company) -> CompanyView {
        CompanyView::new(company.clone(), self.owner_of(company))
    }

    fn check_user_unique(&self, username: &str, email: &str, except: Option<Uuid>) -> Result<(), StoreError> {
        let others = self.users.iter().filter(|u| Some(u.id) != except);
        for u in others {
            if u.username.to_lowercase() == username.to_lowercase() {
                return Err(StoreError::Duplicate { field: "username" });
            }
            if u.email.eq_ignore_ascii_case(email) {
                return Err(StoreError::Duplicate { field: "email" });
            }
        }
        Ok(())
    }

    fn check_company_unique(&self, name: &str, except: Option<Uuid>) -> Result<(), StoreError> {
        let wanted = name.to_lowercase();
        if self.companies.iter().any(|c| Some(c.id) != except && c.name.to_lowercase() == wanted) {
            return Err(StoreError::Duplicate { field: "name" });
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn active_admin_count(&self) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().filter(|u| u.status && u.role == Role::Admin).count() as i64)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.user(id).cloned())
    }

    async fn find_login(&self, email: Option<&str>, username: Option<&str>) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        let found = inner.users.iter().find(|u| {
            u.status
                && (email.is_some_and(|e| u.email.eq_ignore_ascii_case(e))
                    || username.is_some_and(|n| u.username.to_lowercase() == n.to_lowercase()))
        });
        Ok(found.cloned())
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email)))
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        let wanted = username.to_lowercase();
        Ok(inner
            .users
            .iter()
            .any(|u| Some(u.id) != except && u.username.to_lowercase() == wanted))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_user_unique(&user.username, &user.email, None)?;
        let user = user.into_user(Utc::now());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.user(id).filter(|u| u.status).cloned() else {
            return Ok(None);
        };

        let mut updated = current;
        patch.apply(&mut updated, Utc::now());
        inner.check_user_unique(&updated.username, &updated.email, Some(id))?;

        if let Some(slot) = inner.users.iter_mut().find(|u| u.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn deactivate_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id && u.status) else {
            return Ok(None);
        };
        user.status = false;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn list_users(&self, page: Page) -> Result<Paged<User>, StoreError> {
        let inner = self.inner.read().await;
        let active: Vec<&User> = inner.users.iter().filter(|u| u.status).collect();
        let (start, end) = page.bounds(active.len());
        Ok(Paged {
            total: active.len() as i64,
            items: active[start..end].iter().map(|u| (*u).clone()).collect(),
        })
    }

    async fn company_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.check_company_unique(name, except).is_err())
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_company_view(&self, id: Uuid) -> Result<Option<CompanyView>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .companies
            .iter()
            .find(|c| c.id == id && c.status)
            .map(|c| inner.view(c)))
    }

    async fn insert_company(&self, company: NewCompany) -> Result<Company, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_company_unique(&company.name, None)?;
        let company = company.into_company(Utc::now());
        inner.companies.push(company.clone());
        Ok(company)
    }

    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> Result<Option<Company>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.companies.iter().find(|c| c.id == id && c.status).cloned() else {
            return Ok(None);
        };

        let mut updated = current;
        patch.apply(&mut updated, Utc::now());
        inner.check_company_unique(&updated.name, Some(id))?;

        if let Some(slot) = inner.companies.iter_mut().find(|c| c.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn deactivate_company(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(company) = inner.companies.iter_mut().find(|c| c.id == id && c.status) else {
            return Ok(None);
        };
        company.status = false;
        company.updated_at = Utc::now();
        Ok(Some(company.clone()))
    }

    async fn list_companies(&self, filter: &CompanyFilter, page: Page) -> Result<Paged<CompanyView>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Company> = inner.companies.iter().filter(|c| filter.matches(c)).collect();
        if let Some(dir) = filter.order {
            // stable sort keeps insertion order between equal names
            matching.sort_by(|a, b| FilterOrder::compare_names(&a.name, &b.name, dir));
        }

        let (start, end) = page.bounds(matching.len());
        Ok(Paged {
            total: matching.len() as i64,
            items: matching[start..end].iter().map(|c| inner.view(c)).collect(),
        })
    }

    async fn active_companies(&self) -> Result<Vec<CompanyView>, StoreError> {
        let inner = self.inner.read().await;
        let mut active: Vec<&Company> = inner.companies.iter().filter(|c| c.status).collect();
        active.sort_by(|a, b| FilterOrder::compare_names(&a.name, &b.name, crate::filter::SortDirection::Asc));
        Ok(active.into_iter().map(|c| inner.view(c)).collect())
    }
}
