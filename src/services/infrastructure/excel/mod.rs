/// 表格文件处理模块：解析、字段归一化、序列化

pub mod field_mapper;
pub mod sheet_reader;
pub mod sheet_writer;

pub use sheet_reader::SheetReader;
