//! SQL schema for the Hichoux SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Money columns hold decimal strings, timestamps fixed-width RFC 3339 UTC
/// strings (so they sort lexically), booleans 0/1.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    sort_order  INTEGER NOT NULL DEFAULT 0,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS products (
    id            TEXT PRIMARY KEY,
    sku           TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    slug          TEXT NOT NULL UNIQUE,
    description   TEXT NOT NULL DEFAULT '',
    price         TEXT NOT NULL,
    compare_price TEXT,
    stock         INTEGER NOT NULL DEFAULT 0,
    category_id   TEXT REFERENCES categories(id),
    is_featured   INTEGER NOT NULL DEFAULT 0,
    is_active     INTEGER NOT NULL DEFAULT 1,
    images        TEXT NOT NULL DEFAULT '[]',   -- JSON array of URLs
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS customers (
    id          TEXT PRIMARY KEY,
    phone       TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    email       TEXT,
    address     TEXT NOT NULL,
    city        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Rows are never deleted, so rowid doubles as the order number sequence.
CREATE TABLE IF NOT EXISTS orders (
    id               TEXT PRIMARY KEY,
    order_number     TEXT NOT NULL UNIQUE,
    customer_id      TEXT REFERENCES customers(id),
    customer_name    TEXT NOT NULL,
    customer_phone   TEXT NOT NULL,
    customer_email   TEXT,
    shipping_address TEXT NOT NULL,
    shipping_city    TEXT NOT NULL,
    notes            TEXT NOT NULL DEFAULT '',
    subtotal         TEXT NOT NULL,
    shipping_cost    TEXT NOT NULL,
    total            TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'new',
    payment_method   TEXT NOT NULL DEFAULT 'cod',
    source           TEXT NOT NULL DEFAULT 'website',
    created_at       TEXT NOT NULL,
    confirmed_at     TEXT,
    confirmed_by     TEXT,
    shipped_at       TEXT,
    delivered_at     TEXT,
    cancelled_at     TEXT,
    cancelled_reason TEXT
);

-- product_id is a weak reference: the product may only exist in the demo
-- catalog, or may have been deactivated since.
CREATE TABLE IF NOT EXISTS order_items (
    id           TEXT PRIMARY KEY,
    order_id     TEXT NOT NULL REFERENCES orders(id),
    product_id   TEXT,
    product_sku  TEXT NOT NULL,
    product_name TEXT NOT NULL,
    unit_price   TEXT NOT NULL,
    quantity     INTEGER NOT NULL CHECK (quantity >= 1),
    total_price  TEXT NOT NULL
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS order_history (
    id              TEXT PRIMARY KEY,
    order_id        TEXT NOT NULL REFERENCES orders(id),
    status          TEXT NOT NULL,
    note            TEXT NOT NULL DEFAULT '',
    changed_by_name TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shipments (
    id              TEXT PRIMARY KEY,
    order_id        TEXT NOT NULL REFERENCES orders(id),
    carrier         TEXT NOT NULL,
    tracking_number TEXT,
    status          TEXT NOT NULL DEFAULT 'pending',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shipping_labels (
    id           TEXT PRIMARY KEY,
    label_number TEXT NOT NULL UNIQUE,
    carrier      TEXT NOT NULL,
    note         TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shipping_label_items (
    id        TEXT PRIMARY KEY,
    label_id  TEXT NOT NULL REFERENCES shipping_labels(id),
    order_id  TEXT NOT NULL REFERENCES orders(id)
);

CREATE TABLE IF NOT EXISTS team_members (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,   -- JSON
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS orders_phone_idx     ON orders(customer_phone);
CREATE INDEX IF NOT EXISTS orders_created_idx   ON orders(created_at);
CREATE INDEX IF NOT EXISTS items_order_idx      ON order_items(order_id);
CREATE INDEX IF NOT EXISTS history_order_idx    ON order_history(order_id);
CREATE INDEX IF NOT EXISTS shipments_order_idx  ON shipments(order_id);
CREATE INDEX IF NOT EXISTS label_items_label_idx ON shipping_label_items(label_id);

PRAGMA user_version = 1;
";
