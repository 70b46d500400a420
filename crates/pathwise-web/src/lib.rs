//! # Pathwise Web
//!
//! Browser front end for the Pathwise progress tracker.
//!
//! ## Quick Start
//!
//! ```bash
//! # Graphviz `dot` must be on PATH
//! cargo run -p pathwise-web -- --subjects ./subjects
//!
//! # Open http://127.0.0.1:9696 in your browser
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/?subject=<name>` | Rendered graph page |
//! | POST | `/update` | Toggle a topic (`{subject, topic, completed}`) |
//! | GET | `/api/subjects` | Subject names |
//! | GET | `/api/subjects/:subject` | Progress, readiness, and render hints |
//! | GET | `/static/*` | Rendered graph images |

pub mod config;
pub mod error;
pub mod layout;
pub mod page;
pub mod routes;
pub mod state;

pub use config::Config;
pub use state::AppState;
