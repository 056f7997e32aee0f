pub mod a1;
pub mod commands;
pub mod http;
pub mod retry;
pub mod sheets;
pub mod table;
pub mod workbook;
