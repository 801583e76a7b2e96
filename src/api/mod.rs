pub(crate) mod admin;
pub(crate) mod ai;
pub(crate) mod errors;
pub(crate) mod extract;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod student;
pub(crate) mod users;
pub(crate) mod validation;
