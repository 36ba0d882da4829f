use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceDirection {
    Body,
    Coworking,
    Coffee,
    Kids,
}

impl ServiceDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceDirection::Body => "Body",
            ServiceDirection::Coworking => "Coworking",
            ServiceDirection::Coffee => "Coffee",
            ServiceDirection::Kids => "Kids",
        }
    }
}

/// Услуга из каталога (Body и Kids используют один и тот же endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogService {
    pub id: String,
    pub name: String,
    pub category: String,
    pub direction: ServiceDirection,
    pub duration_minutes: String,
    pub price: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    Capsule,
    Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoworkingPlace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    #[serde(default)]
    pub seats: u32,
    #[serde(default)]
    pub price_1h: Option<i64>,
    #[serde(default)]
    pub price_3h: Option<i64>,
    #[serde(default)]
    pub price_day: Option<i64>,
    #[serde(default)]
    pub price_month: Option<i64>,
}
