use crate::cache::Snapshot;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

pub const ROOT_MESSAGE: &str =
    "API de Turnos funcionando. Consulta /turnos para obtener el planning.";
pub const DEVICE_REGISTERED: &str = "Token de dispositivo registrado exitosamente.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Paramètres de `POST /register_device` (requête ou corps JSON).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterDeviceRequest {
    #[serde(default)]
    pub device_token: Option<String>,
}

/// Sérialise le planning d'un snapshot sans le copier.
#[derive(Debug, Clone)]
pub struct ScheduleBody(pub Arc<Snapshot>);

impl Serialize for ScheduleBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.schedule.serialize(serializer)
    }
}
