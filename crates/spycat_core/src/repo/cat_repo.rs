//! Cat repository contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - `list_cats` is ordered by id ascending.
//! - A cat owning a non-completed mission cannot be deleted; the ownership
//!   check and the delete share one transaction.

use crate::model::cat::{validate_salary, Cat, CatId, NewCat};
use crate::model::mission::LifecycleError;
use crate::repo::{ensure_connection_ready, EntityRef, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const CAT_SELECT_SQL: &str = "SELECT
    id,
    name,
    years_of_experience,
    breed,
    salary
FROM cats";

/// Repository interface for cat records.
pub trait CatRepository {
    /// Persists a validated cat and returns it with its new identity.
    fn create_cat(&mut self, cat: &NewCat) -> RepoResult<Cat>;
    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>>;
    fn list_cats(&self) -> RepoResult<Vec<Cat>>;
    /// Changes only the salary field.
    fn update_salary(&mut self, id: CatId, salary: i64) -> RepoResult<Cat>;
    fn delete_cat(&mut self, id: CatId) -> RepoResult<()>;
}

/// SQLite-backed cat repository.
pub struct SqliteCatRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCatRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatRepository for SqliteCatRepository<'_> {
    fn create_cat(&mut self, cat: &NewCat) -> RepoResult<Cat> {
        cat.validate()?;
        let cat = cat.trimmed();

        self.conn.execute(
            "INSERT INTO cats (name, years_of_experience, breed, salary)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                cat.name.as_str(),
                cat.years_of_experience,
                cat.breed.as_str(),
                cat.salary,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        Ok(Cat {
            id,
            name: cat.name,
            years_of_experience: cat.years_of_experience,
            breed: cat.breed,
            salary: cat.salary,
        })
    }

    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>> {
        load_cat(self.conn, id)
    }

    fn list_cats(&self) -> RepoResult<Vec<Cat>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CAT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut cats = Vec::new();
        while let Some(row) = rows.next()? {
            cats.push(parse_cat_row(row)?);
        }
        Ok(cats)
    }

    fn update_salary(&mut self, id: CatId, salary: i64) -> RepoResult<Cat> {
        validate_salary(salary)?;

        let changed = self.conn.execute(
            "UPDATE cats
             SET
                salary = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, salary],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Cat(id)));
        }

        load_cat(self.conn, id)?.ok_or(RepoError::NotFound(EntityRef::Cat(id)))
    }

    fn delete_cat(&mut self, id: CatId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_cat(&tx, id)?.is_none() {
            return Err(RepoError::NotFound(EntityRef::Cat(id)));
        }

        let active: Option<i64> = tx
            .query_row(
                "SELECT id
                 FROM missions
                 WHERE cat_id = ?1
                   AND completed = 0
                 ORDER BY id ASC
                 LIMIT 1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(mission_id) = active {
            return Err(LifecycleError::CatHasActiveMission {
                cat_id: id,
                mission_id,
            }
            .into());
        }

        tx.execute("DELETE FROM cats WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }
}

fn load_cat(conn: &Connection, id: CatId) -> RepoResult<Option<Cat>> {
    let mut stmt = conn.prepare(&format!("{CAT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_cat_row(row)?));
    }
    Ok(None)
}

fn parse_cat_row(row: &Row<'_>) -> RepoResult<Cat> {
    let cat = Cat {
        id: row.get("id")?,
        name: row.get("name")?,
        years_of_experience: row.get("years_of_experience")?,
        breed: row.get("breed")?,
        salary: row.get("salary")?,
    };
    if cat.years_of_experience < 0 || cat.salary < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative numeric field in cats row {}",
            cat.id
        )));
    }
    Ok(cat)
}
