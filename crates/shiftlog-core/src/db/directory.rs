//! Company and role directory
//!
//! The reconciliation core only ever asks "who manages this company" and
//! "what role does this user hold"; account provisioning itself lives
//! outside the core and is reduced here to simple seeding helpers.

use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{Company, CompanyId, Role, UserId};

use super::row;

const COMPANY_COLUMNS: &str =
    "id, name, utc_offset_minutes, auto_close_hour, auto_close_minute, created_at";

/// Trait for role/company lookups (async)
#[allow(async_fn_in_trait)]
pub trait Directory {
    /// The role `user_id` holds in `company_id`, if a membership exists
    async fn role_of(&self, user_id: &UserId, company_id: &CompanyId) -> Result<Option<Role>>;

    /// Users who receive closure summaries and may decide edit requests
    /// (manager, admin, and owner roles)
    async fn managers_of(&self, company_id: &CompanyId) -> Result<Vec<UserId>>;

    /// Look up one company
    async fn company(&self, company_id: &CompanyId) -> Result<Option<Company>>;

    /// All registered companies
    async fn list_companies(&self) -> Result<Vec<Company>>;
}

/// libSQL implementation of `Directory`
pub struct LibSqlDirectory<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlDirectory<'a> {
    /// Create a new directory with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register a company
    pub async fn insert_company(&self, company: &Company) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO companies
                 (id, name, utc_offset_minutes, auto_close_hour, auto_close_minute, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    company.id.as_str(),
                    company.name.as_str(),
                    i64::from(company.utc_offset_minutes),
                    i64::from(company.auto_close_hour),
                    i64::from(company.auto_close_minute),
                    row::ms(company.created_at),
                ],
            )
            .await?;
        Ok(())
    }

    /// Add a user to a company, or update their role/name if already a member
    pub async fn upsert_membership(
        &self,
        user_id: &UserId,
        company_id: &CompanyId,
        role: Role,
        display_name: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO memberships (user_id, company_id, display_name, role)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT (user_id, company_id)
                 DO UPDATE SET role = excluded.role, display_name = excluded.display_name",
                params![
                    user_id.as_str(),
                    company_id.as_str(),
                    display_name,
                    role.as_str()
                ],
            )
            .await?;
        Ok(())
    }

    fn parse_company(row: &libsql::Row) -> Result<Company> {
        Ok(Company {
            id: row::parse(&row.get::<String>(0)?, "id")?,
            name: row.get::<String>(1)?,
            utc_offset_minutes: row.get::<i32>(2)?,
            auto_close_hour: u32::try_from(row.get::<i64>(3)?).unwrap_or(23),
            auto_close_minute: u32::try_from(row.get::<i64>(4)?).unwrap_or(59),
            created_at: row::instant(row.get::<i64>(5)?, "created_at")?,
        })
    }
}

impl Directory for LibSqlDirectory<'_> {
    async fn role_of(&self, user_id: &UserId, company_id: &CompanyId) -> Result<Option<Role>> {
        let mut rows = self
            .conn
            .query(
                "SELECT role FROM memberships WHERE user_id = ? AND company_id = ?",
                params![user_id.as_str(), company_id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row::parse(&row.get::<String>(0)?, "role")?)),
            None => Ok(None),
        }
    }

    async fn managers_of(&self, company_id: &CompanyId) -> Result<Vec<UserId>> {
        let mut rows = self
            .conn
            .query(
                "SELECT user_id FROM memberships
                 WHERE company_id = ? AND role IN ('manager', 'admin', 'owner')
                 ORDER BY user_id ASC",
                params![company_id.as_str()],
            )
            .await?;

        let mut managers = Vec::new();
        while let Some(row) = rows.next().await? {
            managers.push(row::parse(&row.get::<String>(0)?, "user_id")?);
        }
        Ok(managers)
    }

    async fn company(&self, company_id: &CompanyId) -> Result<Option<Company>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?"),
                params![company_id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_company(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_companies(&self) -> Result<Vec<Company>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY created_at ASC, id ASC"),
                (),
            )
            .await?;

        let mut companies = Vec::new();
        while let Some(row) = rows.next().await? {
            companies.push(Self::parse_company(&row)?);
        }
        Ok(companies)
    }
}
