// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Claims do JWT emitido pelo provedor de identidade (colaborador externo).
// Aqui só decodificamos — ninguém emite token neste serviço.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

// A identidade já autenticada que os handlers recebem — usada apenas para
// atribuição (ex.: quem aprovou o bimestre).
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub name: Option<String>,
}
