pub mod column_type;
pub mod errors;
pub mod registry;
pub mod relationship;
pub mod schema_validator;
pub mod table_schema;

// Re-export commonly used types
pub use column_type::{infer_column_type, ColumnType};
pub use errors::CatalogError;
pub use registry::{SchemaExport, TableRegistry};
pub use relationship::{
    junction_table_name, RelationshipDetector, RelationshipEdge, RelationshipKind,
};
pub use schema_validator::{SchemaMismatch, SchemaValidator};
pub use table_schema::{
    foreign_key_column, table_name_from_key, ColumnDef, ForeignKeyDef, TableDefinition,
};
