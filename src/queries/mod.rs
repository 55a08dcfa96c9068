pub mod ddl;
pub mod files;
pub mod files_meta;
pub mod metadata;
pub mod motion;
pub mod objects;
pub mod recordings;
