use sqlx::SqlitePool;

pub const MASTERY_SCHEMA_SQL: &str = include_str!("../../sql/mastery_schema.sql");

pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for line in sql.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("--") && !in_single_quote && !in_double_quote {
            continue;
        }

        for ch in line.chars() {
            match ch {
                '\'' if !in_double_quote => in_single_quote = !in_single_quote,
                '"' if !in_single_quote => in_double_quote = !in_double_quote,
                ';' if !in_single_quote && !in_double_quote => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        current.push('\n');
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

/// Creates every table and index if missing. Safe to run repeatedly.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in split_sql_statements(MASTERY_SCHEMA_SQL) {
        sqlx::query(&stmt).execute(pool).await?;
    }
    Ok(())
}
