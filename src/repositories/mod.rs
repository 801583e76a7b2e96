pub(crate) mod answers;
pub(crate) mod content;
pub(crate) mod exams;
pub(crate) mod health;
pub(crate) mod results;
pub(crate) mod sections;
pub(crate) mod speaking;
pub(crate) mod subscriptions;
pub(crate) mod users;
pub(crate) mod writing;
