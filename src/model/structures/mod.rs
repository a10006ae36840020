pub mod rating_update;
pub mod scope;
