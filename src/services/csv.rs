// src/services/csv.rs

use anyhow::Context;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};

use crate::{
    common::error::AppError,
    models::{entity::EntityKind, listing::MappingTarget},
};

/// Resultado do parse: cabeçalho + linhas de dados (sem linhas em branco).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Célula de uma linha; linhas curtas não são completadas, então índice
    /// além do fim devolve `None`.
    pub fn cell(row: &[String], index: usize) -> Option<&str> {
        row.get(index).map(String::as_str)
    }
}

// =============================================================================
//  PARSE
// =============================================================================

/// Primeira linha não vazia vira cabeçalho. Linhas com tamanhos diferentes
/// são aceitas como vieram (`flexible`).
pub fn parse(text: &str) -> Result<CsvTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut non_blank = Vec::new();
    for record in reader.records() {
        let record = record?;
        if !is_blank(&record) {
            non_blank.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
    }

    let mut records = non_blank.into_iter();
    let headers = records.next().unwrap_or_default();
    let rows = records.collect();

    Ok(CsvTable { headers, rows })
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

// =============================================================================
//  SERIALIZAÇÃO
// =============================================================================

/// Gera o texto CSV preservando exatamente a ordem de colunas e linhas.
/// Aspas só quando o campo tem vírgula, aspas ou quebra de linha.
pub fn serialize(headers: &[String], rows: &[Vec<String>]) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for line in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        writer
            .write_record(line)
            .context("Falha ao escrever linha do CSV")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar o CSV: {}", e.error()))?;
    let mut text = String::from_utf8(bytes).context("CSV gerado não é UTF-8")?;

    // Sem quebra de linha depois da última linha
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

// =============================================================================
//  MAPEAMENTO AUTOMÁTICO
// =============================================================================

/// Campos base que uma importação pode preencher
pub fn import_targets(kind: EntityKind) -> Vec<MappingTarget> {
    kind.columns()
        .iter()
        .filter(|c| c.importable)
        .map(|c| MappingTarget {
            value: c.key.to_string(),
            label: c.label.to_string(),
        })
        .collect()
}

/// Sugestão de mapeamento por coluna (trim + case-insensitive contra `value`
/// ou `label`; primeiro candidato vence). `None` = ignorar a coluna.
pub fn auto_map(headers: &[String], targets: &[MappingTarget]) -> Vec<Option<String>> {
    headers
        .iter()
        .map(|header| {
            let wanted = header.trim().to_lowercase();
            targets
                .iter()
                .find(|t| t.value.to_lowercase() == wanted || t.label.to_lowercase() == wanted)
                .map(|t| t.value.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_quotes_commas_and_crlf() {
        let text = "Name,Note\r\n\"Acme, Inc\",\"He said \"\"hi\"\"\"\r\nGlobex,\"line one\nline two\"\r\n";
        let table = parse(text).unwrap();

        assert_eq!(table.headers, strings(&["Name", "Note"]));
        assert_eq!(
            table.rows,
            vec![
                strings(&["Acme, Inc", "He said \"hi\""]),
                strings(&["Globex", "line one\nline two"]),
            ]
        );
    }

    #[test]
    fn drops_blank_rows_and_keeps_ragged_rows() {
        let text = "\n , \nName,Phone,Industry\nAcme\n,,\n\nGlobex,555,Retail,extra\n";
        let table = parse(text).unwrap();

        assert_eq!(table.headers, strings(&["Name", "Phone", "Industry"]));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], strings(&["Acme"]));
        assert_eq!(CsvTable::cell(&table.rows[0], 2), None);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn empty_input_yields_empty_table() {
        assert_eq!(parse("").unwrap(), CsvTable::default());
        assert_eq!(parse("\r\n\n").unwrap(), CsvTable::default());
    }

    #[test]
    fn serializer_quotes_only_when_needed() {
        let headers = strings(&["Name", "Note"]);
        let rows = vec![strings(&["plain", "a,b"]), strings(&["He said \"hi\"", "x\ny"])];

        let text = serialize(&headers, &rows).unwrap();
        assert_eq!(text, "Name,Note\nplain,\"a,b\"\n\"He said \"\"hi\"\"\",\"x\ny\"");
    }

    #[test]
    fn serialize_then_parse_reproduces_cells() {
        let headers = strings(&["Name", "Quote", "Multi", "Crlf"]);
        let rows = vec![
            strings(&["a,b", "He said \"hi\"", "first\nsecond\nthird", "one\r\ntwo"]),
            strings(&["  padded  ", "\"\"", "", "trailing,"]),
            strings(&["Zoë", "ümlaut", "tab\there", "x"]),
        ];

        let table = parse(&serialize(&headers, &rows).unwrap()).unwrap();
        assert_eq!(table.headers, headers);
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn auto_map_matches_label_or_key_case_insensitive() {
        let targets = import_targets(EntityKind::Contact);
        let headers = strings(&[" First Name ", "EMAIL", "lastname", "nonsense_col", "createdDate"]);

        let mapping = auto_map(&headers, &targets);
        assert_eq!(
            mapping,
            vec![
                Some("firstName".to_string()),
                Some("email".to_string()),
                Some("lastName".to_string()),
                None,
                // colunas de sistema não são alvo de importação
                None,
            ]
        );
    }

    #[test]
    fn auto_map_first_candidate_wins() {
        let targets = vec![
            MappingTarget { value: "phone".into(), label: "Phone".into() },
            MappingTarget { value: "mobilePhone".into(), label: "Phone".into() },
        ];
        assert_eq!(auto_map(&strings(&["phone"]), &targets), vec![Some("phone".to_string())]);
    }
}
