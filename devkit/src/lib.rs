/*!
# Console DevKit - test doubles for the mixnet console

Lets the console be exercised end to end without a real admin service:
- mock admin service (axum) answering the console endpoints
- recording view capturing every render call
- harness wiring both to a `Console`
*/

pub mod mock_backend;
pub mod recording_view;
pub mod test_utils;

pub use mock_backend::MockBackend;
pub use recording_view::{RecordingView, ViewEvent};
pub use test_utils::TestHarness;
