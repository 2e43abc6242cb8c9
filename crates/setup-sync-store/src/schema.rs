use rusqlite_migration::{Migrations, M};

pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(
            "CREATE TABLE models (
                name            TEXT PRIMARY KEY,
                last_synced_at  TEXT
            );

            CREATE TABLE records (
                model           TEXT NOT NULL,
                id              INTEGER NOT NULL,
                payload         TEXT NOT NULL,
                PRIMARY KEY (model, id)
            );

            CREATE INDEX idx_records_model ON records(model);",
        ),
        M::up(
            "CREATE TABLE setup_runs (
                account         TEXT PRIMARY KEY,
                outcome         TEXT NOT NULL,
                missing_json    TEXT NOT NULL DEFAULT '[]',
                finished_at     TEXT NOT NULL
            );",
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }
}
