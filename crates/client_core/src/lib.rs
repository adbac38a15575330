//! Client side of the attendance page: roster loading and attendance
//! submission against the attendance server.

pub mod controller;
pub mod error;
pub mod form;
pub mod transport;
pub mod view;

pub use controller::{AttendanceFormController, RosterOutcome};
pub use error::ClientError;
pub use form::{collect_attendance, FormData, SubmitEvent};
pub use transport::{AttendanceApi, HttpAttendanceApi};
pub use view::{RosterPage, RosterRow, RosterView};
