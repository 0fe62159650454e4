pub(crate) mod answers;
pub(crate) mod controller;
pub(crate) mod countdown;
pub(crate) mod error;
pub(crate) mod navigation;

use std::sync::Arc;

use tokio::sync::Mutex;

pub(crate) use controller::SessionController;
pub(crate) use error::SessionError;

/// The single quiz session served by this process.
pub(crate) type SharedSession = Arc<Mutex<SessionController>>;
