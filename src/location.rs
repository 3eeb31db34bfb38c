//! Location normalization.
//!
//! Stored event locations come in several historical shapes: a plain address
//! string, a structured `{name, address, coordinates}` object with a flat
//! `[lon, lat]` pair, or a legacy GeoJSON-like object whose coordinate field
//! nests the pair one level deeper. Everything is resolved here, once, at
//! the storage boundary; nothing deeper in the call stack branches on shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Location as persisted on the `events.location` JSONB column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredLocation {
    /// Free-text address with no structure.
    Address(String),
    /// Structured venue. The coordinate leaf stays loosely typed so legacy
    /// rows with odd shapes decode and normalize to "unmapped" instead of
    /// failing the whole read.
    Structured {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinates: Option<Value>,
    },
}

/// Canonical location consumed by map rendering and list views.
///
/// `coordinates` is `[longitude, latitude]`, in that order. `None` means
/// "unmapped": the event still appears in lists but never as a map marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address: String,
    pub coordinates: Option<[f64; 2]>,
}

impl StoredLocation {
    /// Resolve a stored value into its canonical form.
    pub fn normalize(&self) -> CanonicalLocation {
        match self {
            StoredLocation::Address(address) => CanonicalLocation {
                name: None,
                address: address.clone(),
                coordinates: None,
            },
            StoredLocation::Structured {
                name,
                address,
                coordinates,
            } => CanonicalLocation {
                name: name.clone(),
                address: address
                    .clone()
                    .or_else(|| name.clone())
                    .unwrap_or_default(),
                coordinates: coordinates.as_ref().and_then(coordinate_pair),
            },
        }
    }
}

impl From<&CanonicalLocation> for StoredLocation {
    fn from(canonical: &CanonicalLocation) -> Self {
        StoredLocation::Structured {
            name: canonical.name.clone(),
            address: Some(canonical.address.clone()),
            coordinates: canonical
                .coordinates
                .map(|pair| serde_json::json!(pair)),
        }
    }
}

/// Extract a `[lon, lat]` pair from a coordinate value, unwrapping one level
/// of legacy GeoJSON nesting if needed. Anything else (wrong arity,
/// non-numeric, non-finite) is unmapped; no fallback position is ever
/// fabricated.
fn coordinate_pair(value: &Value) -> Option<[f64; 2]> {
    let array = match value {
        Value::Array(array) => array,
        // Legacy shape: {"type": "Point", "coordinates": [lon, lat]}.
        Value::Object(object) => object.get("coordinates")?.as_array()?,
        _ => return None,
    };

    let [lon, lat] = array.as_slice() else {
        return None;
    };
    let (lon, lat) = (lon.as_f64()?, lat.as_f64()?);

    if lon.is_finite() && lat.is_finite() {
        Some([lon, lat])
    } else {
        None
    }
}
