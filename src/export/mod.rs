//! Report rendering for the download endpoints. PDF output goes through
//! `printpdf` with the builtin Helvetica faces, spreadsheets through
//! `rust_xlsxwriter`; both render fully in memory.

pub mod excel;
pub mod pdf;
