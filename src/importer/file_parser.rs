// ==========================================
// 批量发货处理引擎 - 文件解析器实现
// ==========================================
// 职责: 二进制电子表格 → RawRow 序列
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 口径: 仅读首个工作表；首行为表头；
//       row_id 按物理行号分配（表头 = 1，首个数据行 = 2），
//       全空白行不物化但行号继续推进
// ==========================================

use crate::domain::record::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::FileParser;
use crate::schema::SchemaRegistry;
use calamine::{Data, DataType, Reader, Xls, Xlsx};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 将单元格渲染为原始字符串。
    /// 唯一的摄取期转换: 日期列下的日期序列号 → 规范 "YYYY-MM-DD"
    fn cell_to_raw(cell: &Data, is_date_column: bool) -> String {
        if is_date_column {
            if let Some(date) = cell.as_date() {
                return date.format("%Y-%m-%d").to_string();
            }
        }
        match cell {
            Data::Empty => String::new(),
            _ => cell.to_string().trim().to_string(),
        }
    }

    fn rows_from_range(
        range: &calamine::Range<Data>,
        schema: &SchemaRegistry,
    ) -> ImportResult<Vec<RawRow>> {
        let date_labels = schema.date_labels();

        let mut rows_iter = range.rows();
        let header_row = rows_iter.next().ok_or(ImportError::EmptySheet)?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, data_row) in rows_iter.enumerate() {
            // 表头为第 1 行，数据行从 2 起编号
            let row_id = (idx + 2) as u32;

            let mut cells = HashMap::with_capacity(headers.len());
            for (col_idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = data_row
                    .get(col_idx)
                    .map(|cell| Self::cell_to_raw(cell, date_labels.contains(header.as_str())))
                    .unwrap_or_default();
                cells.insert(header.clone(), value);
            }

            let row = RawRow { row_id, cells };
            // 全空白行不物化；row_id 已随物理位置推进
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptySheet);
        }
        Ok(rows)
    }

    fn parse_xlsx(bytes: &[u8], schema: &SchemaRegistry) -> ImportResult<Vec<RawRow>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names.first().cloned().ok_or(ImportError::NoWorksheet)?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
        Self::rows_from_range(&range, schema)
    }

    fn parse_xls(bytes: &[u8], schema: &SchemaRegistry) -> ImportResult<Vec<RawRow>> {
        let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names.first().cloned().ok_or(ImportError::NoWorksheet)?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
        Self::rows_from_range(&range, schema)
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, bytes: &[u8], schema: &SchemaRegistry) -> ImportResult<Vec<RawRow>> {
        // 先按 .xlsx 解析；结构性失败（含空表）直接上抛，
        // 仅容器无法识别时回退到旧版 .xls
        match Self::parse_xlsx(bytes, schema) {
            Ok(rows) => Ok(rows),
            Err(ImportError::EmptySheet) => Err(ImportError::EmptySheet),
            Err(ImportError::NoWorksheet) => Err(ImportError::NoWorksheet),
            Err(_) => Self::parse_xls(bytes, schema),
        }
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, bytes: &[u8], _schema: &SchemaRegistry) -> ImportResult<Vec<RawRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_id = (idx + 2) as u32;

            let mut cells = HashMap::with_capacity(headers.len());
            for (col_idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = record
                    .get(col_idx)
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default();
                cells.insert(header.clone(), value);
            }

            let row = RawRow { row_id, cells };
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptySheet);
        }
        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（按扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse_path<P: AsRef<Path>>(
        &self,
        file_path: P,
        schema: &SchemaRegistry,
    ) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes, &ext, schema)
    }

    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        extension: &str,
        schema: &SchemaRegistry,
    ) -> ImportResult<Vec<RawRow>> {
        match extension.to_lowercase().as_str() {
            "csv" => CsvParser.parse_to_raw_rows(bytes, schema),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_rows(bytes, schema),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
