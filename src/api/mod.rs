pub mod handlers;

use log::error;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use serde_json::{Value, json};
use std::io::Cursor;
use thiserror::Error;

fn json_response<'o>(status: Status, body: Value) -> response::Result<'o> {
    let body = body.to_string();
    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(body.len(), Cursor::new(body))
        .ok()
}

/// Failure of `POST /api/analyze`, rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub struct AppError {
    pub status: Status,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn bad_request(error: impl Into<anyhow::Error>) -> Self {
        AppError {
            status: Status::BadRequest,
            error: error.into(),
        }
    }
}

#[rocket::async_trait]
impl<'r, 'o: 'r> Responder<'r, 'o> for AppError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'o> {
        // Only the outermost message reaches the client; the chain is logged
        if self.status.code >= 500 {
            error!("{:#}", self.error);
        }
        json_response(
            self.status,
            json!({
                "success": false,
                "error": self.error.to_string(),
            }),
        )
    }
}

impl<E> From<E> for AppError
where
    anyhow::Error: From<E>,
{
    fn from(err: E) -> Self {
        AppError {
            status: Status::InternalServerError,
            error: anyhow::Error::from(err),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure of static file serving, rendered as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Invalid path")]
    InvalidPath,
    #[error("File not found")]
    NotFound,
    #[error("{0}")]
    Io(anyhow::Error),
}

impl ServeError {
    pub fn status(&self) -> Status {
        match self {
            ServeError::InvalidPath => Status::BadRequest,
            ServeError::NotFound => Status::NotFound,
            ServeError::Io(_) => Status::InternalServerError,
        }
    }
}

#[rocket::async_trait]
impl<'r, 'o: 'r> Responder<'r, 'o> for ServeError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'o> {
        if let ServeError::Io(err) = &self {
            error!("Static file error: {:#}", err);
        }
        json_response(self.status(), json!({ "error": self.to_string() }))
    }
}
