//! HTTP handlers for entity CRUD, catalog metadata, diagram and ad hoc SQL.

pub mod catalog;
pub mod entity;
pub mod sql;
