//! Where-am-I collaborator. The rest of the application only needs a city name
//! for default item labels and an address line for the banner, so the provider
//! surface is two calls: a position fix and a reverse geocode of that fix.

mod poller;

pub use poller::LocationPoller;

use thiserror::Error;

use crate::models::{Address, Coordinates};

/// Failures from a [`LocationProvider`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// No position fix could be obtained.
    #[error("location unavailable: {0}")]
    Unavailable(String),

    /// A fix exists but could not be turned into an address.
    #[error("reverse geocoding failed for {coords}: {reason}")]
    Geocode { coords: Coordinates, reason: String },
}

/// A position together with the address it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub coords: Coordinates,
    pub address: Address,
}

/// Delivered by the poller on every tick.
pub type LocationUpdate = Result<LocationFix, LocationError>;

pub trait LocationProvider {
    fn current_position(&self) -> Result<Coordinates, LocationError>;

    fn reverse_geocode(&self, coords: Coordinates) -> Result<Address, LocationError>;

    /// Position then address, as one fix.
    fn locate(&self) -> LocationUpdate {
        let coords = self.current_position()?;
        let address = self.reverse_geocode(coords)?;
        Ok(LocationFix { coords, address })
    }
}

/// Provider that always reports the position and address it was built with.
/// Without coordinates it reports [`LocationError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    coords: Option<Coordinates>,
    address: Address,
}

impl FixedLocation {
    pub fn new(coords: Option<Coordinates>, address: Address) -> Self {
        Self { coords, address }
    }
}

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.coords
            .ok_or_else(|| LocationError::Unavailable("no position configured".to_string()))
    }

    fn reverse_geocode(&self, coords: Coordinates) -> Result<Address, LocationError> {
        if !(-90.0..=90.0).contains(&coords.latitude)
            || !(-180.0..=180.0).contains(&coords.longitude)
        {
            return Err(LocationError::Geocode {
                coords,
                reason: "coordinates out of range".to_string(),
            });
        }
        Ok(self.address.clone())
    }
}
