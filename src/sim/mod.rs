/// Hourly clock over the simulation window.
pub mod clock;
/// Gaussian noise source.
pub mod noise;
/// Shared diurnal consumption shape.
pub mod profile;
pub mod simulator;

pub use profile::DiurnalProfile;
pub use simulator::{SimulationParams, Simulator, generate};
