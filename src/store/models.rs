use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UuidArray;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub internal_id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub email: String,
    /// PHC-format password hash. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw row as read from SQLite, before the role string is validated.
pub(crate) struct UserRow {
    pub internal_id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    pub fn into_user(self) -> anyhow::Result<User> {
        let role = Role::from_str(&self.role).map_err(|e| anyhow::anyhow!(e))?;
        Ok(User {
            internal_id: self.internal_id,
            public_id: self.public_id,
            name: self.name,
            email: self.email,
            password: self.password,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub internal_id: i64,
    pub public_id: Uuid,
    pub owner_internal_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Join record between a user and a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardMember {
    pub board_internal_id: i64,
    pub user_internal_id: i64,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardList {
    pub internal_id: i64,
    pub public_id: Uuid,
    pub board_internal_id: i64,
    pub title: String,
    pub created_at: String,
}

/// Display order of a board's lists, one row per board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPosition {
    pub internal_id: i64,
    pub public_id: Uuid,
    pub board_internal_id: i64,
    pub list_order: UuidArray,
}

// API view types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDetail {
    pub board: Board,
    pub members: Vec<BoardMember>,
    pub lists: Vec<BoardList>,
}
