//! 输入读取与报表输出

use crate::stats::RunStatistics;
use crate::types::{HeadlineReportRow, MonitorError, MonitorResult, StockReportRow, VendorRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 文件名日期后缀，如 110624
pub fn date_suffix(date: NaiveDate) -> String {
    date.format("%m%d%y").to_string()
}

/// 日志文件名
pub fn log_file_name(date: NaiveDate) -> String {
    format!("vendor_monitor_{}.log", date_suffix(date))
}

/// 读取供应商列表
///
/// 表头不区分大小写；`companyname` 列可缺省。
pub fn read_vendors(path: impl AsRef<Path>) -> MonitorResult<Vec<VendorRecord>> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            MonitorError::Input(format!("Input file '{}' not found", path.display()))
        } else {
            MonitorError::Io(e)
        }
    })?;

    let vendors = parse_vendors(file)?;
    if vendors.is_empty() {
        return Err(MonitorError::Input(format!(
            "Input file '{}' is empty or has no valid data",
            path.display()
        )));
    }

    info!("Successfully loaded {} vendors from {}", vendors.len(), path.display());
    Ok(vendors)
}

pub fn parse_vendors<R: io::Read>(reader: R) -> MonitorResult<Vec<VendorRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
    };

    let symbol_col = column("symbol")
        .ok_or_else(|| MonitorError::Input("missing 'symbol' column in header".to_string()))?;
    let name_col = column("companyname");

    let mut vendors = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or_default().to_string();
        vendors.push(VendorRecord::new(field(Some(symbol_col)), field(name_col)));
    }
    Ok(vendors)
}

/// 两份报表的路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub stock: PathBuf,
    pub headline: PathBuf,
}

impl ReportPaths {
    pub fn new(output_dir: impl AsRef<Path>, date: NaiveDate) -> Self {
        let dir = output_dir.as_ref();
        let suffix = date_suffix(date);
        Self {
            stock: dir.join(format!("vendorstockreport_{suffix}.csv")),
            headline: dir.join(format!("vendorheadlinereport_{suffix}.csv")),
        }
    }
}

/// 报表输出
pub struct ReportWriter {
    paths: ReportPaths,
}

impl ReportWriter {
    /// 输出目录不存在时创建
    pub fn new(output_dir: impl AsRef<Path>, date: NaiveDate) -> MonitorResult<Self> {
        let dir = output_dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self { paths: ReportPaths::new(dir, date) })
    }

    pub fn paths(&self) -> &ReportPaths {
        &self.paths
    }

    pub fn write_stock_report(&self, rows: &[StockReportRow]) -> MonitorResult<usize> {
        write_rows(&self.paths.stock, &StockReportRow::HEADERS, rows)
    }

    pub fn write_headline_report(&self, rows: &[HeadlineReportRow]) -> MonitorResult<usize> {
        write_rows(&self.paths.headline, &HeadlineReportRow::HEADERS, rows)
    }

    /// 写出两份报表；单份失败只记录错误，不影响另一份
    pub fn write_all(
        &self,
        stock_rows: &[StockReportRow],
        headline_rows: &[HeadlineReportRow],
        stats: &mut RunStatistics,
    ) -> bool {
        let stock_ok = match self.write_stock_report(stock_rows) {
            Ok(n) => {
                info!("✓ Stock report written: {} ({} rows)", self.paths.stock.display(), n);
                true
            }
            Err(e) => {
                error!("Failed to write stock report: {}", e);
                stats.record_error(format!("Failed to write stock report: {e}"));
                false
            }
        };

        let headline_ok = match self.write_headline_report(headline_rows) {
            Ok(n) => {
                info!("✓ Headline report written: {} ({} rows)", self.paths.headline.display(), n);
                true
            }
            Err(e) => {
                error!("Failed to write headline report: {}", e);
                stats.record_error(format!("Failed to write headline report: {e}"));
                false
            }
        };

        stock_ok && headline_ok
    }
}

/// 表头总是写出，即使没有数据行
fn write_rows<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> MonitorResult<usize> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}
