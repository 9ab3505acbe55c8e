use std::collections::HashSet;

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::store::DbHandle;
use crate::store::db::BoardDb;
use crate::store::models::{Board, BoardDetail, BoardList, BoardMember, ListPosition};
use crate::types::UuidArray;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBoard {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct BoardService {
    db: DbHandle,
}

fn require_board(db: &BoardDb, id: Uuid) -> anyhow::Result<Board> {
    db.get_board(id)?
        .ok_or_else(|| ServiceError::BoardNotFound { id }.into())
}

impl BoardService {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    pub async fn create_board(&self, req: CreateBoard) -> Result<Board, ServiceError> {
        let title = super::clean_title("title", &req.title)?;
        let description = req.description.unwrap_or_default().trim().to_string();
        let owner_id = req.owner_id;
        let board = self
            .db
            .call(move |db| {
                let owner = db
                    .get_user(owner_id)?
                    .ok_or(ServiceError::UserNotFound { id: owner_id })?;
                db.create_board(owner.internal_id, &title, &description)
            })
            .await
            .map_err(ServiceError::from_db)?;
        tracing::info!(board_id = %board.public_id, owner_id = %owner_id, "board created");
        Ok(board)
    }

    pub async fn board_detail(&self, board_id: Uuid) -> Result<BoardDetail, ServiceError> {
        self.db
            .call(move |db| {
                let board = require_board(db, board_id)?;
                let members = db.list_board_members(board.internal_id)?;
                let lists = db.list_lists_ordered(board.internal_id)?;
                Ok(BoardDetail {
                    board,
                    members,
                    lists,
                })
            })
            .await
            .map_err(ServiceError::from_db)
    }

    pub async fn add_member(
        &self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<BoardMember, ServiceError> {
        let member = self
            .db
            .call(move |db| {
                let board = require_board(db, board_id)?;
                let user = db
                    .get_user(user_id)?
                    .ok_or(ServiceError::UserNotFound { id: user_id })?;
                if db.is_board_member(board.internal_id, user.internal_id)? {
                    return Err(ServiceError::AlreadyMember { board_id, user_id }.into());
                }
                db.add_board_member(board.internal_id, user.internal_id)
            })
            .await
            .map_err(ServiceError::from_db)?;
        tracing::info!(board_id = %board_id, user_id = %user_id, "board member added");
        Ok(member)
    }

    pub async fn create_list(&self, board_id: Uuid, title: &str) -> Result<BoardList, ServiceError> {
        let title = super::clean_title("title", title)?;
        self.db
            .call(move |db| {
                let board = require_board(db, board_id)?;
                db.create_list(board.internal_id, &title)
            })
            .await
            .map_err(ServiceError::from_db)
    }

    pub async fn list_order(&self, board_id: Uuid) -> Result<ListPosition, ServiceError> {
        self.db
            .call(move |db| {
                let board = require_board(db, board_id)?;
                db.get_list_position(board.internal_id)
            })
            .await
            .map_err(ServiceError::from_db)
    }

    /// Replace a board's list order. Every id must name a list on this
    /// board, at most once; lists left out are shown after the ordered ones.
    pub async fn reorder_lists(
        &self,
        board_id: Uuid,
        order: UuidArray,
    ) -> Result<ListPosition, ServiceError> {
        let mut seen = HashSet::new();
        if let Some(dup) = order.iter().find(|id| !seen.insert(**id)) {
            return Err(ServiceError::InvalidInput(format!(
                "list {} appears more than once",
                dup
            )));
        }

        let position = self
            .db
            .call(move |db| {
                let board = require_board(db, board_id)?;
                let known: HashSet<Uuid> = db
                    .list_lists(board.internal_id)?
                    .into_iter()
                    .map(|l| l.public_id)
                    .collect();
                if let Some(unknown) = order.iter().find(|id| !known.contains(*id)) {
                    return Err(ServiceError::InvalidInput(format!(
                        "list {} does not belong to board {}",
                        unknown, board_id
                    ))
                    .into());
                }
                db.set_list_order(board.internal_id, &order)
            })
            .await
            .map_err(ServiceError::from_db)?;
        tracing::debug!(board_id = %board_id, lists = position.list_order.len(), "lists reordered");
        Ok(position)
    }
}
