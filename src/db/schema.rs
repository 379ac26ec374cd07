//! Database schema for vetagenda.
//!
//! Every statement is idempotent so the bootstrap can run on each start.

/// Schema statements, executed in order.
pub const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid            TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,           -- iterations$salt$key, or legacy sha256 hex
    profile         TEXT NOT NULL DEFAULT 'recepcionista',
    status          TEXT NOT NULL DEFAULT 'ativo',
    last_login      TEXT,
    created_at      TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS recovery_tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    token       TEXT NOT NULL UNIQUE,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at  INTEGER NOT NULL,            -- unix seconds
    used        INTEGER NOT NULL DEFAULT 0
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_recovery_tokens_user ON recovery_tokens(user_id)",
    r#"
CREATE TABLE IF NOT EXISTS rooms (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL UNIQUE,
    kind        TEXT NOT NULL,
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS appointments (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid             TEXT NOT NULL UNIQUE,
    room_id          INTEGER NOT NULL REFERENCES rooms(id),
    professional_id  TEXT NOT NULL,
    client_id        TEXT NOT NULL,
    pet_id           TEXT NOT NULL,
    starts_at        TEXT NOT NULL,
    ends_at          TEXT NOT NULL,
    service_type     TEXT NOT NULL,
    notes            TEXT,
    status           TEXT NOT NULL DEFAULT 'AGENDADO',
    created_by       TEXT,
    created_at       TEXT NOT NULL,
    cancelled_by     TEXT,
    cancelled_at     TEXT
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_appointments_room ON appointments(room_id, status)",
];
