//! API HTTP (axum) au-dessus du cache de planning.
//!
//! - `GET /` : message de vie.
//! - `GET /turnos` : planning résolu `date → personne → {tipo_turno, horario}`.
//! - `POST /register_device` : accusé de réception d'un token, sans stockage.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
