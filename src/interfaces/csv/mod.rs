pub mod operation_reader;
pub mod safe_writer;
