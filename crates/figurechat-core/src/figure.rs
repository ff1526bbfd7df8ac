//! Figures a user can chat with, and the roster they are picked from.

use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// A selectable chat counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(default, alias = "avatar")]
    pub avatar_ref: String,
    /// Id the chat backend knows this figure by, when it differs from `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<i64>,
}

impl Figure {
    pub fn new(id: i64, name: &str, description: &str, avatar_ref: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            avatar_ref: avatar_ref.to_string(),
            remote_id: None,
        }
    }

    pub fn with_remote_id(mut self, remote_id: i64) -> Self {
        self.remote_id = Some(remote_id);
        self
    }

    /// The id sent as `figure_id` in chat requests.
    pub fn chat_id(&self) -> i64 {
        self.remote_id.unwrap_or(self.id)
    }
}

/// Ordered list of figures with unique ids.
///
/// The roster is plain data handed to the UI and the responders, so tests can
/// swap in their own figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    figures: Vec<Figure>,
}

impl Roster {
    pub fn new(figures: Vec<Figure>) -> Result<Self, RosterError> {
        let mut roster = Self { figures: Vec::with_capacity(figures.len()) };
        for figure in figures {
            roster.add(figure)?;
        }
        Ok(roster)
    }

    pub fn add(&mut self, figure: Figure) -> Result<(), RosterError> {
        if self.get(figure.id).is_some() {
            return Err(RosterError::DuplicateId(figure.id));
        }
        self.figures.push(figure);
        Ok(())
    }

    pub fn get(&self, id: i64) -> Option<&Figure> {
        self.figures.iter().find(|f| f.id == id)
    }

    pub fn position(&self, id: i64) -> Option<usize> {
        self.figures.iter().position(|f| f.id == id)
    }

    /// Smallest id greater than every id in the roster.
    pub fn next_id(&self) -> i64 {
        self.figures.iter().map(|f| f.id).max().unwrap_or(0) + 1
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn len(&self) -> usize {
        self.figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            figures: vec![
                Figure::new(
                    1,
                    "Albert Einstein",
                    "Physicist, Theory of Relativity",
                    "https://upload.wikimedia.org/wikipedia/commons/d/d3/Albert_Einstein_Head.jpg",
                ),
                Figure::new(
                    2,
                    "Isaac Newton",
                    "Mathematician, Laws of Motion",
                    "https://upload.wikimedia.org/wikipedia/commons/2/2e/Isaac_Newton_1689.jpg",
                ),
                Figure::new(
                    3,
                    "Marie Curie",
                    "Chemist, Radioactivity Pioneer",
                    "https://upload.wikimedia.org/wikipedia/commons/6/6d/Marie_Curie_c1920.jpg",
                ),
            ],
        }
    }
}
