use axum::http::StatusCode;
use passabola_core::CoreResult;
use tracing::error;

use crate::error::AppError;

/// Runs a service call on the blocking pool. Password hashing and the
/// whole-file collection reads and writes stay off the async workers.
pub async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(AppError::from),
        Err(err) => {
            error!(?err, "tarefa bloqueante interrompida");
            Err(AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erro interno do servidor",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use passabola_core::PlatformError;

    use super::*;

    #[tokio::test]
    async fn results_cross_the_blocking_pool() {
        let caller = std::thread::current().id();
        let worker = run_blocking(|| Ok(std::thread::current().id())).await.unwrap();
        assert_ne!(worker, caller);

        let err = run_blocking(|| -> CoreResult<()> {
            Err(PlatformError::NotFound("Jogadora não encontrada".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Jogadora não encontrada");
    }

    #[tokio::test]
    async fn panicking_task_is_an_internal_error() {
        let err = run_blocking(|| -> CoreResult<()> { panic!("falha") })
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
