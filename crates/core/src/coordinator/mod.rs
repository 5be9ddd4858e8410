//! Screen-scoped state machines.
//!
//! Each coordinator owns one `watch` channel holding its view state. Intents
//! are plain method calls that update the state synchronously and/or spawn
//! work on the Tokio runtime; callers read snapshots with `state()` or
//! follow changes with `subscribe()`. Dropping a coordinator cancels every
//! task it started.

pub mod detail;
pub mod favorites;
pub mod library;
mod task;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub use detail::{DetailCoordinator, DetailPhase, DetailViewState};
pub use favorites::{FavoritesCoordinator, FavoritesViewState};
pub use library::{LibraryCoordinator, LibraryViewState};

/// Apply `update` unless `cancel` has fired.
///
/// The check runs under the channel's write lock, so a superseded task can
/// never overwrite the state published by its replacement.
pub(crate) fn publish_unless_cancelled<S>(
    state: &watch::Sender<S>,
    cancel: &CancellationToken,
    update: impl FnOnce(&mut S),
) -> bool {
    state.send_if_modified(|current| {
        if cancel.is_cancelled() {
            return false;
        }
        update(current);
        true
    })
}
