//! Generated-by-hand equivalent of `diesel print-schema`: one table per keyspace, matching
//! `migrations/2024-01-01-000000_create_tracker_tables/up.sql`.

diesel::table! {
    parent_state (pointer) {
        pointer -> Text,
        data -> Text,
    }
}

diesel::table! {
    parent_block (hash) {
        hash -> Text,
        data -> Text,
    }
}

diesel::table! {
    parent_block_state (hash) {
        hash -> Text,
        data -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(parent_state, parent_block, parent_block_state,);
