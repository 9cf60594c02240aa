//! Focus board todo list.
//!
//! The list is stored as one JSON array under the `focus-todos` key, newest
//! first. It is user data, so it never expires.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{CacheKey, Clock, Persistence};
use crate::error::{DashError, Result};
use crate::keys::DashboardKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
  /// Creation time in epoch milliseconds, unique within the list
  pub id: i64,
  pub text: String,
  pub completed: bool,
}

pub struct TodoList<S: Persistence> {
  storage: Arc<S>,
  clock: Arc<dyn Clock>,
}

impl<S: Persistence> TodoList<S> {
  pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
    Self { storage, clock }
  }

  /// All todos, newest first. An unreadable list is treated as empty.
  pub fn list(&self) -> Result<Vec<Todo>> {
    let Some(raw) = self.storage.read(&DashboardKey::Todos.cache_hash())? else {
      return Ok(Vec::new());
    };

    match serde_json::from_str(&raw) {
      Ok(todos) => Ok(todos),
      Err(e) => {
        warn!(error = %e, "discarding undecodable todo list");
        Ok(Vec::new())
      }
    }
  }

  /// Add a todo at the top of the list.
  pub fn add(&self, text: &str) -> Result<Todo> {
    let text = text.trim();
    if text.is_empty() {
      return Err(DashError::InvalidPayload("todo text is empty".to_string()));
    }

    let mut todos = self.list()?;
    let newest = todos.iter().map(|t| t.id).max();
    let id = match newest {
      Some(max) if max >= self.clock.now_millis() => max + 1,
      _ => self.clock.now_millis(),
    };

    let todo = Todo {
      id,
      text: text.to_string(),
      completed: false,
    };
    todos.insert(0, todo.clone());
    self.save(&todos)?;

    info!(id, "todo added");
    Ok(todo)
  }

  /// Flip the completed flag of a todo.
  pub fn toggle(&self, id: i64) -> Result<Todo> {
    let mut todos = self.list()?;
    let todo = todos
      .iter_mut()
      .find(|t| t.id == id)
      .ok_or(DashError::UnknownTodo(id))?;
    todo.completed = !todo.completed;
    let toggled = todo.clone();

    self.save(&todos)?;
    Ok(toggled)
  }

  /// Delete a todo. Returns false when there was nothing to delete.
  pub fn delete(&self, id: i64) -> Result<bool> {
    let mut todos = self.list()?;
    let before = todos.len();
    todos.retain(|t| t.id != id);
    if todos.len() == before {
      return Ok(false);
    }

    self.save(&todos)?;
    Ok(true)
  }

  fn save(&self, todos: &[Todo]) -> Result<()> {
    let raw = serde_json::to_string(todos)?;
    self.storage.write(&DashboardKey::Todos.cache_hash(), &raw)
  }
}
