//! Cat registry use-case service.
//!
//! # Invariants
//! - `create_cat` persists nothing unless the breed is confirmed known.
//! - "Unknown breed" and "could not check breed" stay distinct failures.

use crate::breeds::BreedValidator;
use crate::model::cat::{Cat, CatId, NewCat};
use crate::repo::cat_repo::CatRepository;
use crate::repo::EntityRef;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::log_failure;
use log::info;

/// Cat registry over a repository and a breed validator.
pub struct CatService<'v, R: CatRepository> {
    repo: R,
    breeds: &'v dyn BreedValidator,
}

impl<'v, R: CatRepository> CatService<'v, R> {
    pub fn new(repo: R, breeds: &'v dyn BreedValidator) -> Self {
        Self { repo, breeds }
    }

    /// Validates input, then the breed, then persists the cat.
    pub fn create_cat(&mut self, cat: &NewCat) -> ServiceResult<Cat> {
        let result = self.create_cat_inner(cat);
        match &result {
            Ok(created) => info!(
                "event=cat_create module=service status=ok cat_id={}",
                created.id
            ),
            Err(err) => log_failure("cat_create", err),
        }
        result
    }

    fn create_cat_inner(&mut self, cat: &NewCat) -> ServiceResult<Cat> {
        cat.validate()
            .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

        let known = self
            .breeds
            .is_known_breed(&cat.breed)
            .map_err(ServiceError::ValidationUnavailable)?;
        if !known {
            return Err(ServiceError::InvalidBreed(cat.breed.trim().to_string()));
        }

        Ok(self.repo.create_cat(cat)?)
    }

    /// All cats ordered by id ascending.
    pub fn list_cats(&self) -> ServiceResult<Vec<Cat>> {
        Ok(self.repo.list_cats()?)
    }

    pub fn get_cat(&self, id: CatId) -> ServiceResult<Cat> {
        self.repo
            .get_cat(id)?
            .ok_or(ServiceError::NotFound(EntityRef::Cat(id)))
    }

    pub fn update_salary(&mut self, id: CatId, salary: i64) -> ServiceResult<Cat> {
        let result = self.repo.update_salary(id, salary).map_err(ServiceError::from);
        match &result {
            Ok(_) => info!("event=cat_update_salary module=service status=ok cat_id={id}"),
            Err(err) => log_failure("cat_update_salary", err),
        }
        result
    }

    /// Deletes a cat; rejected with `Conflict` while it owns an active mission.
    pub fn delete_cat(&mut self, id: CatId) -> ServiceResult<()> {
        let result = self.repo.delete_cat(id).map_err(ServiceError::from);
        match &result {
            Ok(()) => info!("event=cat_delete module=service status=ok cat_id={id}"),
            Err(err) => log_failure("cat_delete", err),
        }
        result
    }
}
