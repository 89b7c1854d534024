//! Cat (field agent) records.
//!
//! # Invariants
//! - `years_of_experience` and `salary` are never negative.
//! - `name` and `breed` are stored trimmed and non-empty.
//! - Breed is validated against the remote vocabulary at creation only.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identity assigned by storage; ascending in creation order.
pub type CatId = i64;

/// Persisted cat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cat {
    pub id: CatId,
    pub name: String,
    pub years_of_experience: i64,
    pub breed: String,
    /// Monthly salary; the only field mutable after creation.
    pub salary: i64,
}

/// Creation payload for a cat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCat {
    pub name: String,
    pub years_of_experience: i64,
    pub breed: String,
    pub salary: i64,
}

/// Field-level validation failures for cat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatValidationError {
    BlankName,
    BlankBreed,
    NegativeExperience(i64),
    NegativeSalary(i64),
}

impl Display for CatValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "cat name must not be blank"),
            Self::BlankBreed => write!(f, "cat breed must not be blank"),
            Self::NegativeExperience(value) => {
                write!(f, "years_of_experience must be >= 0, got {value}")
            }
            Self::NegativeSalary(value) => write!(f, "salary must be >= 0, got {value}"),
        }
    }
}

impl Error for CatValidationError {}

impl NewCat {
    pub fn new(
        name: impl Into<String>,
        years_of_experience: i64,
        breed: impl Into<String>,
        salary: i64,
    ) -> Self {
        Self {
            name: name.into(),
            years_of_experience,
            breed: breed.into(),
            salary,
        }
    }

    /// Checks every field without touching storage or the breed vocabulary.
    pub fn validate(&self) -> Result<(), CatValidationError> {
        if self.name.trim().is_empty() {
            return Err(CatValidationError::BlankName);
        }
        if self.breed.trim().is_empty() {
            return Err(CatValidationError::BlankBreed);
        }
        if self.years_of_experience < 0 {
            return Err(CatValidationError::NegativeExperience(
                self.years_of_experience,
            ));
        }
        validate_salary(self.salary)
    }

    /// Returns a copy with surrounding whitespace removed from text fields.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            years_of_experience: self.years_of_experience,
            breed: self.breed.trim().to_string(),
            salary: self.salary,
        }
    }
}

pub fn validate_salary(salary: i64) -> Result<(), CatValidationError> {
    if salary < 0 {
        return Err(CatValidationError::NegativeSalary(salary));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_salary, CatValidationError, NewCat};

    #[test]
    fn validate_rejects_blank_and_negative_fields() {
        assert_eq!(
            NewCat::new("  ", 1, "Abyssinian", 10).validate(),
            Err(CatValidationError::BlankName)
        );
        assert_eq!(
            NewCat::new("Tom", 1, "\t", 10).validate(),
            Err(CatValidationError::BlankBreed)
        );
        assert_eq!(
            NewCat::new("Tom", -1, "Abyssinian", 10).validate(),
            Err(CatValidationError::NegativeExperience(-1))
        );
        assert_eq!(
            NewCat::new("Tom", 0, "Abyssinian", -5).validate(),
            Err(CatValidationError::NegativeSalary(-5))
        );
    }

    #[test]
    fn zero_values_are_valid() {
        assert!(NewCat::new("Tom", 0, "Abyssinian", 0).validate().is_ok());
        assert!(validate_salary(0).is_ok());
    }

    #[test]
    fn trimmed_strips_text_fields_only() {
        let cat = NewCat::new("  Tom ", 3, " Bengal\n", 100).trimmed();
        assert_eq!(cat.name, "Tom");
        assert_eq!(cat.breed, "Bengal");
        assert_eq!(cat.years_of_experience, 3);
        assert_eq!(cat.salary, 100);
    }
}
