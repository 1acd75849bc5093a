//! Row shapes for the three keyspaces, each a hex-encoded key plus a `serde_json`-encoded value
//! column — deliberately schema-light, the same approach the teacher's `GlobalDb` uses for its
//! own metadata keyspace (see DESIGN.md).

use diesel::{Insertable, Queryable};

use crate::schema::{parent_block, parent_block_state, parent_state};

#[derive(Queryable, Insertable)]
#[diesel(table_name = parent_state)]
pub struct ParentStateRow {
    pub pointer: String,
    pub data: String,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = parent_block)]
pub struct ParentBlockRow {
    pub hash: String,
    pub data: String,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = parent_block_state)]
pub struct ParentBlockStateRow {
    pub hash: String,
    pub data: String,
}
