pub(crate) mod delivery;
pub(crate) mod direct_upload;
pub(crate) mod local_export;
pub(crate) mod question_store;
pub(crate) mod relay;
pub(crate) mod storage;
pub(crate) mod submission;
