// src/models/records.rs
//
// Modelos de resposta dos caminhos de leitura: planilhas de avaliação por
// bimestre e os registros anuais. Nada disso é persistido — tudo é derivado
// da caderneta + roster no momento da requisição (ver services::aggregation).

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::gradebook::{FieldStatus, NumericScores, StudentSnapshot};

// Linha da planilha de avaliações do ensino regular: registro armazenado ou
// placeholder zerado (nunca persistido), sempre com as faltas recalculadas
// da chamada.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumericEvaluationRow {
    pub student: StudentSnapshot,
    #[serde(flatten)]
    pub scores: NumericScores,
    pub total_absences: u32,
}

// Linha da planilha da educação infantil: cobertura completa do catálogo de
// campos de experiência da escola ("not-yet" sintético para o que falta).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeEvaluationRow {
    pub student: StudentSnapshot,
    pub evaluations: Vec<FieldStatus>,
    pub total_absences: u32,
}

// Média de um bimestre dentro do registro anual.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TermAverage {
    pub term: Option<String>,
    pub average: f64,
}

// Registro anual de aprendizagem (as duas modalidades).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecordRow {
    pub student: StudentSnapshot,
    pub bimonthly_averages: Vec<TermAverage>,
    pub annual_average: f64,
    pub total_absences: u32,
}

// Registro geral da educação infantil: melhor estágio já alcançado por campo
// de experiência ao longo de todos os bimestres + soma das faltas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneralRecordRow {
    pub student: StudentSnapshot,
    pub fields: Vec<FieldStatus>,
    pub total_absences: u32,
}
