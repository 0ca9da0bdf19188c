pub mod redb_record_store;
