//! SQLite schema applied when the pool is built.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS revision_schedules (
    schedule_id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    item_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    is_active BOOLEAN NOT NULL DEFAULT 1,
    next_due_at TIMESTAMP NOT NULL,
    checkpoints TEXT NOT NULL,
    adaptive TEXT NOT NULL,
    history TEXT NOT NULL DEFAULT '[]',
    metrics TEXT NOT NULL,
    queue TEXT NOT NULL,
    manually_rescheduled BOOLEAN NOT NULL DEFAULT 0,
    rescheduled_to TIMESTAMP,
    pause_until TIMESTAMP,
    version INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL,
    UNIQUE (owner_id, item_id)
);

CREATE INDEX IF NOT EXISTS idx_revision_schedules_owner_due
    ON revision_schedules (owner_id, next_due_at);

CREATE INDEX IF NOT EXISTS idx_revision_schedules_owner_status
    ON revision_schedules (owner_id, status);
"#;
