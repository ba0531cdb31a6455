// src/models/school.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Linha da lista de chamada de uma turma, como devolvida pelo provedor de
// roster (CRUD de turmas/alunos — colaborador externo, só leitura aqui).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: Uuid,
    pub name: String,
    pub cpf: Option<String>,
}

// Campo de experiência da BNCC cadastrado pela escola (educação infantil).
// Usado para completar a grade de avaliações no GET.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceField {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}
