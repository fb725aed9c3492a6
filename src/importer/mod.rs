// ==========================================
// 批量发货处理引擎 - 摄取层
// ==========================================
// 职责: 商户上传文件 → RawRow 序列
// 红线: 摄取只做一种转换（日期列的日期序列号 → YYYY-MM-DD），
//       其余一律保持原始值，类型转换归校验层
// ==========================================

pub mod error;
pub mod file_parser;

pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};

use crate::domain::record::RawRow;
use crate::schema::SchemaRegistry;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（摄取阶段）
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文件字节为原始行序列
    ///
    /// # 参数
    /// - bytes: 上传文件内容
    /// - schema: 列模式（仅用于识别日期列）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 按物理行序的原始行
    /// - Err(ImportError): 二进制无法解析，或仅有表头没有数据行
    fn parse_to_raw_rows(&self, bytes: &[u8], schema: &SchemaRegistry) -> ImportResult<Vec<RawRow>>;
}
