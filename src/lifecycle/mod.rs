//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Coordinator::new → install signals → Migrate directory
//!             → Bind listener → Spawn server → mark_running()
//!
//! Shutdown (coordinator.rs):
//!     SIGTERM / server exit → Stopping (once) → Stop accepting
//!             → Drain (bounded) → Force abort → Close directory → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM → coordinator.on_termination_signal()
//! ```
//!
//! # Design Decisions
//! - State transitions are compare-exchange latches (state.rs)
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has a grace period: in-flight connections are aborted after it
//! - Shutdown errors are logged, never propagated

pub mod coordinator;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use coordinator::{Coordinator, LifecycleError, ServerExitGuard};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{start, StartupError};
pub use state::{LifecycleState, StateCell};
