//! Rolodex client library: typed HTTP transport, the row-selection state
//! machine, and the task polling loop used by UI frontends and the CLI.

pub mod poller;
pub mod selection;
pub mod state;
pub mod transport;

pub use poller::{PollEvent, TaskPoller, TrackedTask};
pub use rolodex_tasks::model::{Task, TaskProgress, TaskStatus};
pub use selection::{SelectionMode, SelectionState};
pub use state::ClientState;
pub use transport::{ApiError, HttpTransport, Transport};
