use axum::http::StatusCode;
use shared::error::{ApiError, ErrorCode};
use storage::{LogWriter, VoteLogError};
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiContext {
    pub writer: LogWriter,
}

pub async fn export_votes_csv(ctx: &ApiContext) -> Result<String, ApiError> {
    ctx.writer.log().export_csv().await.map_err(|err| match err {
        VoteLogError::NotFound(_) => {
            ApiError::new(ErrorCode::NotFound, "no votes have been recorded yet")
        }
        other => {
            error!(error = %other, "failed to build CSV from vote log");
            ApiError::new(ErrorCode::Internal, "could not generate the CSV")
        }
    })
}

pub async fn reset_votes_log(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.writer.reset().await.map_err(|err| {
        error!(error = %err, "failed to reset vote log");
        ApiError::new(ErrorCode::Internal, "could not clear the vote log")
    })?;
    info!(path = %ctx.writer.log().path().display(), "vote log cleared");
    Ok(())
}

pub fn status_for(err: &ApiError) -> StatusCode {
    match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
