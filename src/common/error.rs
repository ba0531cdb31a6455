use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// A taxonomia segue o que as rotas realmente devolvem: 404 para agregado ou
// sub-entidade inexistente, 400 para campo obrigatório ausente, 409 para
// conflito (chamada já existente, escrita obsoleta) e 500 para o resto.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    MissingFields(&'static str),

    #[error("A data de término não pode ser anterior à data de início")]
    InvalidTermDates,

    #[error("Operação não disponível para esta modalidade de caderneta")]
    WrongTrack,

    #[error("Caderneta não encontrada")]
    GradebookNotFound,

    #[error("Bimestre não encontrado")]
    TermNotFound,

    #[error("Aula não encontrada")]
    LessonNotFound,

    #[error("Já existe uma chamada para essa aula")]
    AttendanceAlreadyExists,

    // A caderneta foi alterada por outra requisição entre a leitura e a
    // gravação (token de versão obsoleto).
    #[error("A caderneta foi modificada por outra requisição, tente novamente")]
    StaleWrite,

    #[error("Token inválido")]
    InvalidToken,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "message": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::MissingFields(_) | AppError::InvalidTermDates | AppError::WrongTrack => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }

            AppError::GradebookNotFound | AppError::TermNotFound | AppError::LessonNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }

            AppError::AttendanceAlreadyExists | AppError::StaleWrite => {
                (StatusCode::CONFLICT, self.to_string())
            }

            AppError::InvalidToken | AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que o `thiserror` nos deu;
            // como ferramenta interna, a mensagem também vai na resposta.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "message": error_message }));
        (status, body).into_response()
    }
}
