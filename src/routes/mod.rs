pub(crate) mod api;
pub(crate) mod graph;
pub(crate) mod health;
