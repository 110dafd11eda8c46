use crate::schema::{TableSchema, ALL_TABLES};

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let pk = if col.name == schema.primary_key {
            " PRIMARY KEY"
        } else {
            ""
        };

        columns.push(format!(
            "    {} {}{}{}",
            col.name,
            col.col_type.sql_type(),
            pk,
            null_constraint
        ));
    }

    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for a table's secondary indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                index.name,
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}

/// The complete DDL script: every table, then every index
pub fn generate_schema_sql() -> String {
    let mut statements: Vec<String> = ALL_TABLES
        .iter()
        .map(|schema| generate_create_table(schema))
        .collect();
    statements.extend(ALL_TABLES.iter().flat_map(|schema| generate_indexes(schema)));

    let mut script = statements.join(";\n\n");
    script.push_str(";\n");
    script
}
