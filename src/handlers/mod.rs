pub mod revision;
