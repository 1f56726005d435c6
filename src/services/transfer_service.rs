// src/services/transfer_service.rs

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};

use crate::{
    common::error::AppError,
    models::{
        entity::{Column, CrmRecord, EntityKind, ImportRow, RecordDraft},
        fields::FieldDefinition,
        listing::{
            ExportFile, ImportOutcome, ImportPreview, ImportRequest, ListParams, MappingTarget,
        },
    },
    services::{
        csv::{self, CsvTable},
        record_service::RecordService,
    },
};

const PREVIEW_ROWS: usize = 5;

/// Uma coluna do export: campo base do catálogo ou campo customizado.
enum ExportColumn {
    Base(&'static Column),
    Custom(FieldDefinition),
}

impl ExportColumn {
    fn header(&self) -> String {
        match self {
            ExportColumn::Base(column) => column.label.to_string(),
            ExportColumn::Custom(definition) => definition.label.clone(),
        }
    }
}

/// Import/export em lote via CSV sobre o CRUD de um tipo de registro.
pub struct TransferService<R: CrmRecord> {
    records: RecordService<R>,
}

impl<R: CrmRecord> Clone for TransferService<R> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<R: CrmRecord> TransferService<R> {
    pub fn new(records: RecordService<R>) -> Self {
        Self { records }
    }

    // =========================================================================
    //  EXPORT
    // =========================================================================

    /// CSV do resultado filtrado. Com `all=true` ignora a paginação.
    pub async fn export(&self, params: &ListParams) -> Result<ExportFile, AppError> {
        let kind = R::KIND;
        let columns = self.export_columns(params).await?;
        let records = self.records.list(params).await?.data;

        // Valores customizados só são buscados se alguma coluna pedir
        let has_custom = columns.iter().any(|c| matches!(c, ExportColumn::Custom(_)));
        let custom_values = if has_custom {
            let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
            self.records.fields().values_by_record(kind, &ids).await?
        } else {
            HashMap::new()
        };

        let headers: Vec<String> = columns.iter().map(ExportColumn::header).collect();
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| match column {
                        ExportColumn::Base(col) => record.cell(col.key).render(),
                        ExportColumn::Custom(definition) => custom_values
                            .get(record.id())
                            .and_then(|values| {
                                values.iter().find(|v| v.field_definition_id == definition.id)
                            })
                            .map(|v| v.render(definition.field_type))
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .collect();

        tracing::info!("📤 Export de {}: {} linhas, {} colunas", kind, rows.len(), headers.len());

        Ok(ExportFile {
            filename: export_filename(kind, Utc::now().date_naive()),
            content: csv::serialize(&headers, &rows)?,
        })
    }

    async fn export_columns(&self, params: &ListParams) -> Result<Vec<ExportColumn>, AppError> {
        let kind = R::KIND;
        let keys: Vec<String> = if params.columns.is_empty() {
            kind.default_export_columns().iter().map(|k| k.to_string()).collect()
        } else {
            params.columns.clone()
        };

        let mut definitions: HashMap<String, FieldDefinition> = HashMap::new();
        if keys.iter().any(|k| kind.column(k).is_none()) {
            definitions = self
                .records
                .fields()
                .list_fields(kind)
                .await?
                .into_iter()
                .map(|d| (d.field_key.clone(), d))
                .collect();
        }

        let mut columns = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(column) = kind.column(&key) {
                columns.push(ExportColumn::Base(column));
            } else if let Some(definition) = definitions.remove(&key) {
                columns.push(ExportColumn::Custom(definition));
            } else {
                tracing::debug!("Coluna de export '{}' desconhecida em {}", key, kind);
            }
        }
        Ok(columns)
    }

    // =========================================================================
    //  IMPORT
    // =========================================================================

    pub fn targets(&self) -> Vec<MappingTarget> {
        csv::import_targets(R::KIND)
    }

    /// Cabeçalhos, primeiras linhas e o mapeamento sugerido. Não grava nada.
    pub fn preview(&self, text: &str) -> Result<ImportPreview, AppError> {
        let table = parse_non_empty(text)?;
        let targets = self.targets();
        let mapping = csv::auto_map(&table.headers, &targets);

        Ok(ImportPreview {
            sample_rows: table.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
            total_rows: table.rows.len(),
            headers: table.headers,
            targets,
            mapping,
        })
    }

    /// Importa linha a linha. Falha de uma linha não interrompe as outras e
    /// nada é desfeito.
    pub async fn import(&self, request: ImportRequest) -> Result<ImportOutcome, AppError> {
        let kind = R::KIND;
        let table = parse_non_empty(&request.csv)?;
        let targets = self.targets();

        let mapping = match request.mapping {
            Some(confirmed) => sanitize_mapping(confirmed, &targets),
            None => csv::auto_map(&table.headers, &targets),
        };

        let mut outcome = ImportOutcome::default();
        for (index, row) in table.rows.iter().enumerate() {
            // +2: cabeçalho é a linha 1
            let line = index + 2;
            let values = map_row(row, &mapping);

            let missing: Vec<&str> = kind
                .required_fields()
                .iter()
                .copied()
                .filter(|key| values.get(*key).is_none_or(|v| v.is_empty()))
                .collect();
            if !missing.is_empty() {
                tracing::warn!("⚠️ Linha {} ignorada: faltam {:?}", line, missing);
                outcome.failed += 1;
                continue;
            }

            let draft = R::Draft::from_import_row(&ImportRow(&values));
            match self.records.create(draft).await {
                Ok(_) => outcome.success += 1,
                Err(e) => {
                    tracing::warn!("⚠️ Linha {} rejeitada: {}", line, e);
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            "📥 Import de {}: {} importados, {} falharam",
            kind,
            outcome.success,
            outcome.failed
        );
        Ok(outcome)
    }
}

// --- Helpers ---

pub fn export_filename(kind: EntityKind, date: NaiveDate) -> String {
    format!("{}_export_{}.csv", kind.as_str(), date.format("%Y-%m-%d"))
}

fn parse_non_empty(text: &str) -> Result<CsvTable, AppError> {
    let table = csv::parse(text)
        .map_err(|e| AppError::InvalidInput(format!("CSV malformado: {}", e)))?;
    if table.headers.is_empty() {
        return Err(AppError::InvalidInput("O arquivo CSV não tem linha de cabeçalho.".to_string()));
    }
    Ok(table)
}

/// Alvos fora do catálogo viram "skip"
fn sanitize_mapping(mapping: Vec<Option<String>>, targets: &[MappingTarget]) -> Vec<Option<String>> {
    mapping
        .into_iter()
        .map(|target| {
            let target = target?;
            if targets.iter().any(|t| t.value == target) {
                Some(target)
            } else {
                tracing::warn!("Mapeamento para '{}' ignorado: campo não importável", target);
                None
            }
        })
        .collect()
}

/// Chave do campo -> valor (com trim). Células ausentes em linhas curtas são ignoradas.
fn map_row(row: &[String], mapping: &[Option<String>]) -> HashMap<String, String> {
    mapping
        .iter()
        .enumerate()
        .filter_map(|(index, target)| {
            let key = target.as_ref()?;
            let value = CsvTable::cell(row, index)?;
            Some((key.clone(), value.trim().to_string()))
        })
        .collect()
}
