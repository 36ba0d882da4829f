pub mod auth;
pub mod booking;
pub mod catalog;
pub mod client;
pub mod event;
pub mod payment;
pub mod trainer;

pub use booking::{BookingFilter, BookingStatus, ClientInfo, ScheduleBooking, ScheduleBookingCreate, ScheduleBookingUpdate};
pub use client::Client;
pub use event::{BookingEvent, EventStatus};
pub use payment::{Payment, PaymentCreate};
pub use trainer::Trainer;
