//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`.
//! Regenerate with `diesel print-schema` after a schema change.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        /// Lowercased; unique.
        email -> Varchar,
        /// PHC-formatted Argon2 hash.
        password_hash -> Text,
        /// `admin` or `editor`.
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Page sections in display order.
    ///
    /// `position` carries the display order; it is unique, with the check
    /// deferred to commit so a batch can swap positions.
    sections (id) {
        id -> Uuid,
        name -> Text,
        title -> Text,
        content -> Text,
        position -> Int4,
        is_visible -> Bool,
        /// Optimistic concurrency counter, starts at 1.
        revision -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, sections);
