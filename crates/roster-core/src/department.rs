//! Departments: plain records with no invariants of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub id:          Uuid,
  pub name:        String,
  pub description: String,
  /// Name of the head of department, if any.
  pub head:        Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  pub head:        Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentUpdate {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub head:        Option<String>,
}

impl DepartmentUpdate {
  pub fn apply(self, d: &mut Department, now: DateTime<Utc>) {
    if let Some(name) = self.name {
      d.name = name;
    }
    if let Some(description) = self.description {
      d.description = description;
    }
    if self.head.is_some() {
      d.head = self.head;
    }
    d.updated_at = now;
  }
}
