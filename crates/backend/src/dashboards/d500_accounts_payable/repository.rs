use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use contracts::dashboards::d500_accounts_payable::{
    document_base_number, PayableRecord, DOCUMENT_TYPE_NOT_INFORMED, SUPPLIER_NOT_INFORMED,
};
use csv::StringRecord;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::PayablesError;
use crate::shared::format::{format_currency_brl_text, INVALID_VALUE};

/// Loaded payables, immutable for its whole lifetime
#[derive(Debug)]
pub struct PayablesTable {
    records: Vec<PayableRecord>,
    source: PathBuf,
    loaded_at: DateTime<Local>,
}

impl PayablesTable {
    pub fn from_records(records: Vec<PayableRecord>, source: impl Into<PathBuf>) -> Self {
        Self {
            records,
            source: source.into(),
            loaded_at: Local::now(),
        }
    }

    pub fn records(&self) -> &[PayableRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }
}

/// Shared handle to the current table snapshot.
///
/// The table is read once by [`PayablesStore::open`] and then only replaced
/// by [`PayablesStore::reload`]. Readers hold an `Arc` to the snapshot they
/// started with, so a reload never changes data under a running request.
pub struct PayablesStore {
    source: PathBuf,
    delimiter: u8,
    table: RwLock<Arc<PayablesTable>>,
}

impl PayablesStore {
    pub fn open(source: impl Into<PathBuf>, delimiter: u8) -> Result<Self, PayablesError> {
        let source = source.into();
        let table = load_from_path(&source, delimiter)?;
        Ok(Self {
            source,
            delimiter,
            table: RwLock::new(Arc::new(table)),
        })
    }

    /// Store over an already loaded table; `delimiter` is used by later reloads
    pub fn from_table(table: PayablesTable, delimiter: u8) -> Self {
        Self {
            source: table.source.clone(),
            delimiter,
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub async fn snapshot(&self) -> Arc<PayablesTable> {
        self.table.read().await.clone()
    }

    /// Re-read the source file; the previous snapshot stays active on failure
    pub async fn reload(&self) -> Result<Arc<PayablesTable>, PayablesError> {
        let source = self.source.clone();
        let delimiter = self.delimiter;
        let table = tokio::task::spawn_blocking(move || load_from_path(&source, delimiter))
            .await??;
        let table = Arc::new(table);
        *self.table.write().await = table.clone();
        tracing::info!(
            "Payables reloaded from {}: {} records",
            self.source.display(),
            table.len()
        );
        Ok(table)
    }
}

/// Read and parse the payables CSV at `path`
pub fn load_from_path(path: &Path, delimiter: u8) -> Result<PayablesTable, PayablesError> {
    if !path.exists() {
        return Err(PayablesError::FileNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let table = PayablesTable::from_records(parse_csv(file, delimiter)?, path);
    if table.is_empty() {
        tracing::warn!("Payables file {} has no rows", path.display());
    } else {
        tracing::info!("Loaded {} payables from {}", table.len(), path.display());
    }
    Ok(table)
}

/// Column positions resolved from the header row
struct ColumnMap {
    supplier: usize,
    document_number: usize,
    document_type: usize,
    issue_date: usize,
    due_date: usize,
    settlement_date: usize,
    document_value: usize,
    discount_value: usize,
    balance_value: usize,
    status: usize,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Result<Self, PayablesError> {
        let find = |source_name: &'static str, alias: &str| -> Result<usize, PayablesError> {
            headers
                .iter()
                .position(|h| {
                    let h = h.trim_start_matches('\u{FEFF}').trim();
                    h.eq_ignore_ascii_case(source_name) || h.eq_ignore_ascii_case(alias)
                })
                .ok_or(PayablesError::MissingColumn(source_name))
        };

        Ok(Self {
            supplier: find("fornecedor", "supplier")?,
            document_number: find("numero_documento", "document_number")?,
            document_type: find("descricao_tipo_documento", "document_type")?,
            issue_date: find("data_emissao", "issue_date")?,
            due_date: find("data_vencimento", "due_date")?,
            settlement_date: find("data_quitacao", "settlement_date")?,
            document_value: find("valor_documento", "document_value")?,
            discount_value: find("valor_desconto", "discount_value")?,
            balance_value: find("valor_saldo", "balance_value")?,
            status: find("status_documento", "status")?,
        })
    }
}

/// Parse payables from CSV text.
///
/// Every required column must be present in the header. Malformed rows are
/// skipped; bad numbers become 0 and bad dates become unknown.
pub fn parse_csv<R: Read>(reader: R, delimiter: u8) -> Result<Vec<PayableRecord>, PayablesError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    tracing::debug!(
        "Payables CSV headers: {:?}",
        headers.iter().collect::<Vec<_>>()
    );
    let columns = ColumnMap::resolve(&headers)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut invalid_amounts = 0usize;

    for result in reader.records() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Skipping malformed CSV record: {}", e);
                skipped += 1;
                continue;
            }
        };

        let text = |index: usize| -> Option<String> {
            row.get(index)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut amount = |index: usize| -> f64 {
            let raw = row.get(index).unwrap_or_default();
            if format_currency_brl_text(raw) == INVALID_VALUE {
                invalid_amounts += 1;
            }
            parse_amount(raw)
        };
        let document_value = amount(columns.document_value);
        let discount_value = amount(columns.discount_value);
        let balance_value = amount(columns.balance_value);

        let document_number = text(columns.document_number).unwrap_or_default();

        records.push(PayableRecord {
            supplier: text(columns.supplier)
                .unwrap_or_else(|| SUPPLIER_NOT_INFORMED.to_string()),
            document_base_number: document_base_number(&document_number),
            document_number,
            document_type: text(columns.document_type)
                .unwrap_or_else(|| DOCUMENT_TYPE_NOT_INFORMED.to_string()),
            issue_date: row.get(columns.issue_date).and_then(parse_date),
            due_date: row.get(columns.due_date).and_then(parse_date),
            settlement_date: row.get(columns.settlement_date).and_then(parse_date),
            document_value,
            discount_value,
            balance_value,
            status: text(columns.status).unwrap_or_default(),
        });
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} malformed payables rows", skipped);
    }
    if invalid_amounts > 0 {
        tracing::warn!("{} non-numeric amounts read as 0", invalid_amounts);
    }

    Ok(records)
}

/// Comma decimal separators are normalized; anything unparseable is 0
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Unparseable or blank dates are unknown
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
fornecedor,numero_documento,descricao_tipo_documento,data_emissao,data_vencimento,data_quitacao,valor_documento,valor_desconto,valor_saldo,status_documento
ACME,100/1,Boleto,2024-01-01,2024-01-11,2024-01-10,\"1000,50\",\"10,5\",0,quitado
,200,,2024-01-05,not a date,,abc,,300,aberto
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_csv_sample() {
        let records = parse_csv(SAMPLE.as_bytes(), b',').unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.supplier, "ACME");
        assert_eq!(first.document_number, "100/1");
        assert_eq!(first.document_base_number, "100");
        assert_eq!(first.issue_date, Some(date(2024, 1, 1)));
        assert_eq!(first.settlement_date, Some(date(2024, 1, 10)));
        assert_eq!(first.document_value, 1000.5);
        assert_eq!(first.discount_value, 10.5);
        assert!(first.is_settled());
    }

    #[test]
    fn test_missing_values_are_coerced() {
        let records = parse_csv(SAMPLE.as_bytes(), b',').unwrap();
        let second = &records[1];
        assert_eq!(second.supplier, SUPPLIER_NOT_INFORMED);
        assert_eq!(second.document_type, DOCUMENT_TYPE_NOT_INFORMED);
        assert_eq!(second.document_base_number, "200");
        assert_eq!(second.due_date, None);
        assert_eq!(second.settlement_date, None);
        assert_eq!(second.document_value, 0.0);
        assert_eq!(second.discount_value, 0.0);
        assert_eq!(second.balance_value, 300.0);
        assert!(second.is_open());
    }

    #[test]
    fn test_english_headers_and_semicolon() {
        let text = "supplier;document_number;document_type;issue_date;due_date;settlement_date;document_value;discount_value;balance_value;status\n\
                    X;1;NF;01/02/2024;2024-02-10 00:00:00;;5,25;0;5,25;Open\n";
        let records = parse_csv(text.as_bytes(), b';').unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].issue_date, Some(date(2024, 2, 1)));
        assert_eq!(records[0].due_date, Some(date(2024, 2, 10)));
        assert_eq!(records[0].balance_value, 5.25);
        assert!(records[0].is_open());
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let text = "fornecedor,numero_documento\nA,1\n";
        let err = parse_csv(text.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, PayablesError::MissingColumn("descricao_tipo_documento")));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let path = std::env::temp_dir().join("d500-payables-does-not-exist.csv");
        let err = load_from_path(&path, b',').unwrap_err();
        assert!(matches!(err, PayablesError::FileNotFound(p) if p == path));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1234,56"), 1234.56);
        assert_eq!(parse_amount(" 10.5 "), 10.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("n/a"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-15"), Some(date(2024, 3, 15)));
        assert_eq!(parse_date("15/03/2024"), Some(date(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15T08:30:00"), Some(date(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15 08:30:00.000"), Some(date(2024, 3, 15)));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[tokio::test]
    async fn test_store_snapshot() {
        let records = parse_csv(SAMPLE.as_bytes(), b',').unwrap();
        let table = PayablesTable::from_records(records, "memory.csv");
        let store = PayablesStore::from_table(table, b',');
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.source(), Path::new("memory.csv"));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let records = parse_csv(SAMPLE.as_bytes(), b',').unwrap();
        let missing = std::env::temp_dir().join("d500-reload-missing.csv");
        let table = PayablesTable::from_records(records, &missing);
        let store = PayablesStore::from_table(table, b',');
        assert!(store.reload().await.is_err());
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_reload_uses_store_delimiter() {
        let path = std::env::temp_dir().join(format!("d500-reload-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "fornecedor;numero_documento;descricao_tipo_documento;data_emissao;data_vencimento;data_quitacao;valor_documento;valor_desconto;valor_saldo;status_documento\n\
             A;1;Boleto;2024-01-01;2024-01-10;;100,50;0;100,50;aberto\n",
        )
        .unwrap();

        let table = PayablesTable::from_records(Vec::new(), &path);
        let store = PayablesStore::from_table(table, b';');
        let reloaded = store.reload().await;
        std::fs::remove_file(&path).unwrap();

        let table = reloaded.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].balance_value, 100.5);
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[test]
    fn test_non_numeric_amounts_read_as_zero() {
        let text = "fornecedor,numero_documento,descricao_tipo_documento,data_emissao,data_vencimento,data_quitacao,valor_documento,valor_desconto,valor_saldo,status_documento\n\
                    A,1,NF,,,,abc,inf,12,aberto\n";
        let records = parse_csv(text.as_bytes(), b',').unwrap();
        assert_eq!(records[0].document_value, 0.0);
        assert_eq!(records[0].discount_value, 0.0);
        assert_eq!(records[0].balance_value, 12.0);
    }
}
