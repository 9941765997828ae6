//! Unit test modules.

mod config_test;
mod description_ingest_test;
mod source_test;
mod tracker_properties_test;
