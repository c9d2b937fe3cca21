//! Reservation-calling service integration: the external contract, client
//! implementations, and the background status poller.

pub mod service;
pub mod tracker;

pub use service::{
    CallStatus, CallStatusResponse, HttpReservationService, ReservationDecision,
    ReservationService, ReservationServiceError, StartCallRequest, StartCallResponse,
    StaticReservationService,
};
pub use tracker::{spawn_poller, PollEvent};
