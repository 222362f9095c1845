//! Dashboard model shared by the web and terminal front-ends.
//!
//! [`render`] is a pure function of the filter state and the annotated data;
//! [`Session`] owns the loaded data and handles regeneration.

pub mod session;
pub mod state;
pub mod view;

pub use session::{DataStatus, Session, SessionError};
pub use state::DashboardState;
pub use view::{CityPanel, ChartPoint, DashboardView, ForecastPanel, MapMarker, render};
