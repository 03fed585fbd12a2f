//! Data models for GoBarber entities.
//!
//! This module contains the wire types exchanged with the GoBarber API:
//!
//! - `User`: The authenticated principal
//! - `Provider`: Barbers that accept appointments
//! - `AvailabilityItem`, `DayAvailability`: Hourly slots for one provider and day
//! - `NewAppointment`, `Appointment`: Booking requests and the server's echo
//! - `ProfileUpdate`, `SignUp`: Account forms sent to the API

pub mod appointment;
pub mod profile;
pub mod provider;
pub mod user;

pub use appointment::{Appointment, NewAppointment};
pub use profile::{PasswordChange, ProfileUpdate, SignUp};
pub use provider::{AvailabilityItem, AvailabilitySlot, DayAvailability, Provider};
pub use user::User;
