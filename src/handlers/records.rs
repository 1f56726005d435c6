// src/handlers/records.rs
//
// Peças comuns dos handlers de Accounts e Contacts.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::models::listing::ExportFile;

/// Resposta de exclusão bem-sucedida
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

pub fn deleted() -> Json<DeleteResponse> {
    Json(DeleteResponse { success: true })
}

/// O CSV vai como anexo para o navegador salvar com o nome sugerido
pub fn csv_attachment(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    )
        .into_response()
}

pub fn removed_values(count: u64) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "removedValues": count }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_attachment_sets_download_headers() {
        let response = csv_attachment(ExportFile {
            filename: "account_export_2024-03-09.csv".into(),
            content: "Name\nAcme".into(),
        });

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"account_export_2024-03-09.csv\""
        );
    }
}
